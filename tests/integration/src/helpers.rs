//! Test doubles for both transports and a recording event handler

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wakebot_common::BotToken;
use wakebot_core::{
    GatewaySocket, HttpMethod, HttpRequest, HttpResponse, HttpTransport, InteractionResponseType,
    MessageResponse, PendingInteraction, Snowflake, SocketEvent, TransportError,
};
use wakebot_gateway::protocol::ReadyPayload;
use wakebot_gateway::{
    DispatchEvent, EventHandler, GatewayClient, GatewayOptions, InteractionResponder, RestGateway,
};

use crate::fixtures::{hello, ready, API_BASE, GATEWAY_QUERY, HEARTBEAT_INTERVAL, TOKEN};

// ============================================================================
// Socket
// ============================================================================

#[derive(Default)]
struct SocketState {
    inbound: VecDeque<SocketEvent>,
    sent: Vec<Value>,
    opened: Vec<String>,
    connected: bool,
    closes: usize,
}

/// In-memory gateway socket
///
/// Clones share state, so a test keeps one handle while the client owns another.
/// `open` connects immediately and queues [`SocketEvent::Connected`].
#[derive(Clone, Default)]
pub struct FakeSocket {
    state: Arc<Mutex<SocketState>>,
}

impl FakeSocket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an inbound frame
    pub fn push(&self, frame: &Value) {
        self.state
            .lock()
            .inbound
            .push_back(SocketEvent::Text(frame.to_string()));
    }

    /// Queue inbound text as-is, valid JSON or not
    pub fn push_text(&self, text: &str) {
        self.push_event(SocketEvent::Text(text.to_string()));
    }

    pub fn push_event(&self, event: SocketEvent) {
        self.state.lock().inbound.push_back(event);
    }

    /// Simulate the peer going away without a close frame
    pub fn drop_connection(&self) {
        self.state.lock().connected = false;
    }

    pub fn sent(&self) -> Vec<Value> {
        self.state.lock().sent.clone()
    }

    /// Frames sent with the given op code
    pub fn sent_with_op(&self, op: u64) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|frame| frame["op"].as_u64() == Some(op))
            .collect()
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().opened.clone()
    }

    pub fn closes(&self) -> usize {
        self.state.lock().closes
    }
}

impl GatewaySocket for FakeSocket {
    fn open(&mut self, url: &str) {
        let mut state = self.state.lock();
        state.opened.push(url.to_string());
        state.connected = true;
        state.inbound.push_back(SocketEvent::Connected);
    }

    fn poll(&mut self) -> Option<SocketEvent> {
        self.state.lock().inbound.pop_front()
    }

    fn send_text(&mut self, text: &str) -> bool {
        let mut state = self.state.lock();
        if !state.connected {
            return false;
        }
        match serde_json::from_str(text) {
            Ok(frame) => {
                state.sent.push(frame);
                true
            }
            Err(_) => false,
        }
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.connected = false;
        state.closes += 1;
    }
}

// ============================================================================
// HTTP
// ============================================================================

struct Route {
    method: HttpMethod,
    fragment: String,
    status: u16,
    body: String,
}

#[derive(Default)]
struct HttpState {
    routes: Vec<Route>,
    requests: Vec<HttpRequest>,
}

#[derive(Default)]
struct HttpInner {
    state: Mutex<HttpState>,
    delay: Mutex<Duration>,
    busy: AtomicBool,
    overlaps: AtomicUsize,
}

/// Scripted HTTP transport that also detects overlapping use
///
/// Requests are answered by the first route whose method matches and whose
/// fragment occurs in the URL; anything else gets a 404.
#[derive(Clone, Default)]
pub struct FakeHttp {
    inner: Arc<HttpInner>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(self, method: HttpMethod, fragment: &str, status: u16, body: &str) -> Self {
        self.inner.state.lock().routes.push(Route {
            method,
            fragment: fragment.to_string(),
            status,
            body: body.to_string(),
        });
        self
    }

    /// Hold every request for `delay` before answering
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock() = delay;
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.state.lock().requests.clone()
    }

    /// Number of requests whose URL contains `fragment`
    pub fn count(&self, fragment: &str) -> usize {
        self.inner
            .state
            .lock()
            .requests
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }

    /// Times a request started while another was still being served
    pub fn overlaps(&self) -> usize {
        self.inner.overlaps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for FakeHttp {
    async fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if self.inner.busy.swap(true, Ordering::SeqCst) {
            self.inner.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        let delay = *self.inner.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = {
            let mut state = self.inner.state.lock();
            let response = state
                .routes
                .iter()
                .find(|r| r.method == request.method && request.url.contains(&r.fragment))
                .map_or_else(
                    || HttpResponse::new(404, r#"{"message":"404: Not Found","code":0}"#),
                    |r| HttpResponse::new(r.status, r.body.clone()),
                );
            state.requests.push(request);
            response
        };

        self.inner.busy.store(false, Ordering::SeqCst);
        Ok(response)
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Records what reaches each handler method
#[derive(Default)]
pub struct RecordingHandler {
    pub readies: Vec<String>,
    pub resumed: usize,
    pub messages: Vec<Value>,
    pub interactions: Vec<Snowflake>,
    pub dispatched: Vec<String>,
    /// Answer every interaction with this text
    pub auto_reply: Option<String>,
}

impl EventHandler for RecordingHandler {
    fn on_ready(&mut self, ready: &ReadyPayload, _event: &DispatchEvent) {
        self.readies.push(ready.session_id.clone());
    }

    fn on_resumed(&mut self, _event: &DispatchEvent) {
        self.resumed += 1;
    }

    fn on_message_create(&mut self, event: &DispatchEvent) {
        self.messages.push(event.data.clone());
    }

    fn on_interaction(
        &mut self,
        interaction: &PendingInteraction,
        responder: &mut InteractionResponder,
        _event: &DispatchEvent,
    ) {
        self.interactions.push(interaction.id);
        if let Some(text) = &self.auto_reply {
            let _ = responder.respond(
                InteractionResponseType::ChannelMessageWithSource,
                MessageResponse::text(text.clone()),
            );
        }
    }

    fn on_dispatch(&mut self, event: &DispatchEvent) {
        self.dispatched.push(event.name.clone());
    }
}

// ============================================================================
// Client
// ============================================================================

pub type TestClient = GatewayClient<FakeSocket, RecordingHandler>;

/// Options matching the fixtures
pub fn test_options(rate_limit: bool) -> GatewayOptions {
    GatewayOptions {
        rate_limit,
        gateway_query: GATEWAY_QUERY.to_string(),
        ..GatewayOptions::new(BotToken::new(TOKEN))
    }
}

pub fn test_rest(http: &FakeHttp) -> RestGateway {
    RestGateway::new(http.clone(), API_BASE, BotToken::new(TOKEN))
}

/// Build a client over the given fakes
pub fn test_client(socket: &FakeSocket, http: &FakeHttp, rate_limit: bool) -> TestClient {
    GatewayClient::new(
        socket.clone(),
        RecordingHandler::default(),
        test_rest(http),
        test_options(rate_limit),
    )
}

/// Log in and complete the Hello/Identify/READY handshake at `now`
pub async fn connect_ready(client: &mut TestClient, socket: &FakeSocket, now: u64) {
    assert!(client.login(1).await, "login did not start");
    socket.push(&hello(HEARTBEAT_INTERVAL));
    socket.push(&ready(1));
    client.tick(now).await;
}
