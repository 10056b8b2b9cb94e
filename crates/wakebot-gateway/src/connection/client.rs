//! Gateway client
//!
//! Drives one duplex connection through
//! `Disconnected -> Connecting -> AwaitingHello -> Identifying | Resuming -> Connected`.
//! The client has no timers of its own: the caller invokes [`GatewayClient::tick`]
//! with a monotonic millisecond clock and every time-based decision is made there.

use super::{HeartbeatScheduler, RateLimiter, Session};
use crate::events::EventHandler;
use crate::handlers::{Directive, EventDispatcher};
use crate::interactions::InteractionResponder;
use crate::protocol::{CloseCode, GatewayMessage, IdentifyPayload, IdentifyProperties, ResumePayload};
use crate::rest::RestGateway;
use serde::{Deserialize, Serialize};
use wakebot_common::{BotToken, DiscordConfig};
use wakebot_core::{GatewaySocket, Snowflake, SocketEvent};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection and no attempt in progress
    Disconnected,
    /// Socket is being opened
    Connecting,
    /// Socket is open, waiting for Hello
    AwaitingHello,
    /// Identify sent, waiting for READY
    Identifying,
    /// Resume sent, waiting for RESUMED
    Resuming,
    /// Session established
    Connected,
}

impl ConnectionState {
    /// A login or resume attempt is underway
    pub fn is_handshaking(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::AwaitingHello | Self::Identifying | Self::Resuming
        )
    }
}

/// Static connection parameters
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub token: BotToken,
    /// Intents used when the caller has not supplied any
    pub intents: u64,
    /// Appended to the gateway endpoint (version and encoding)
    pub gateway_query: String,
    /// Enforce the outbound send budget
    pub rate_limit: bool,
    pub properties: IdentifyProperties,
    /// Give up on a socket that has not opened after this long
    pub connect_timeout_ms: u64,
}

impl GatewayOptions {
    pub const DEFAULT_GATEWAY_QUERY: &'static str = "/?v=10&encoding=json";
    pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;

    pub fn new(token: BotToken) -> Self {
        Self {
            token,
            intents: 0,
            gateway_query: Self::DEFAULT_GATEWAY_QUERY.to_string(),
            rate_limit: true,
            properties: IdentifyProperties::host(),
            connect_timeout_ms: Self::DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl From<&DiscordConfig> for GatewayOptions {
    fn from(config: &DiscordConfig) -> Self {
        Self {
            intents: config.intents,
            gateway_query: config.gateway_query.clone(),
            rate_limit: config.rate_limit,
            ..Self::new(config.token.clone())
        }
    }
}

/// Gateway connection supervisor
///
/// Owns the socket, the session identity, and the handler events are forwarded to.
/// Nothing here returns an error to the caller: failures are logged and leave the
/// client offline, and the caller recovers by calling [`login`](Self::login) again.
pub struct GatewayClient<S, H> {
    socket: S,
    handler: H,
    rest: RestGateway,
    responder: InteractionResponder,
    options: GatewayOptions,
    session: Session,
    heartbeat: HeartbeatScheduler,
    limiter: RateLimiter,
    state: ConnectionState,
    intents: u64,
    now: u64,
    connecting_since: u64,
}

impl<S: GatewaySocket, H: EventHandler> GatewayClient<S, H> {
    pub fn new(socket: S, handler: H, rest: RestGateway, options: GatewayOptions) -> Self {
        Self {
            socket,
            handler,
            responder: InteractionResponder::new(rest.clone()),
            rest,
            limiter: RateLimiter::new(options.rate_limit),
            intents: options.intents,
            options,
            session: Session::new(),
            heartbeat: HeartbeatScheduler::new(),
            state: ConnectionState::Disconnected,
            now: 0,
            connecting_since: 0,
        }
    }

    /// Replace the interaction responder
    #[must_use]
    pub fn with_responder(mut self, responder: InteractionResponder) -> Self {
        self.responder = responder;
        self
    }

    // === Accessors ===

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the socket reported itself connected at the last tick
    pub fn is_online(&self) -> bool {
        self.session.is_online()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn application_id(&self) -> Option<Snowflake> {
        self.session.application_id()
    }

    pub fn heartbeat(&self) -> &HeartbeatScheduler {
        &self.heartbeat
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn rest(&self) -> &RestGateway {
        &self.rest
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    pub fn responder(&self) -> &InteractionResponder {
        &self.responder
    }

    pub fn responder_mut(&mut self) -> &mut InteractionResponder {
        &mut self.responder
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    // === Lifecycle ===

    /// Start a connection attempt
    ///
    /// Resolves the endpoint over REST when none is cached. Returns `false` without
    /// side effects when an attempt is already underway or the endpoint cannot be
    /// resolved; the caller retries on a later tick.
    pub async fn login(&mut self, intents: u64) -> bool {
        if self.state.is_handshaking() {
            tracing::debug!(state = ?self.state, "Login already in progress");
            return false;
        }
        self.intents = intents;

        let Some(endpoint) = self.resolve_endpoint().await else {
            return false;
        };
        let url = format!(
            "{}{}",
            endpoint.trim_end_matches('/'),
            self.options.gateway_query
        );

        self.heartbeat.reset();
        self.state = ConnectionState::Connecting;
        self.connecting_since = self.now;

        tracing::info!(
            url = %url,
            resuming = self.session.is_resumable(),
            "Connecting to gateway"
        );
        self.socket.open(&url);
        true
    }

    /// Close the connection and forget the session
    ///
    /// Idempotent. The next login resolves a fresh endpoint and identifies anew.
    pub fn logout(&mut self) {
        let was_disconnected = self.state == ConnectionState::Disconnected;
        self.disconnect();
        self.session.clear_identity();
        self.session.clear_gateway_url();
        if !was_disconnected {
            tracing::info!("Logged out of gateway");
        }
    }

    /// Advance the client to `now`
    ///
    /// Drains the socket, refreshes the online flag, rolls the rate window, sends a
    /// heartbeat when one is due, and tears the connection down when heartbeats have
    /// gone unacknowledged for longer than one interval.
    pub async fn tick(&mut self, now: u64) {
        self.now = self.now.max(now);
        let now = self.now;

        while let Some(event) = self.socket.poll() {
            match event {
                SocketEvent::Connected => {
                    if self.state == ConnectionState::Connecting {
                        tracing::debug!("Socket open, awaiting Hello");
                        self.state = ConnectionState::AwaitingHello;
                    }
                }
                SocketEvent::Text(text) => {
                    let directive = EventDispatcher::dispatch(
                        &text,
                        &mut self.session,
                        &mut self.responder,
                        &mut self.handler,
                    );
                    self.apply(directive).await;
                }
                SocketEvent::Closed { code, reason } => self.on_closed(code, &reason),
                SocketEvent::Error(error) => {
                    tracing::warn!(error = %error, "Socket error");
                    self.transport_lost();
                }
            }
        }

        let connected = self.socket.is_connected();
        self.session.set_online(connected);
        if !connected && self.state != ConnectionState::Disconnected {
            if self.state == ConnectionState::Connecting {
                if now.saturating_sub(self.connecting_since) > self.options.connect_timeout_ms {
                    tracing::warn!(
                        timeout_ms = self.options.connect_timeout_ms,
                        "Gateway connect timed out"
                    );
                    self.transport_lost();
                }
            } else {
                self.transport_lost();
            }
        }

        self.limiter.refresh(now);

        if connected && self.heartbeat.is_due(now) {
            self.send_heartbeat(now).await;
        }

        if self.heartbeat.is_stalled(now) {
            tracing::warn!(
                interval_ms = self.heartbeat.interval_ms(),
                unacked_since = ?self.heartbeat.unacked_since(),
                "Heartbeat not acknowledged, dropping connection"
            );
            self.logout();
        }
    }

    // === Internals ===

    async fn resolve_endpoint(&mut self) -> Option<String> {
        if let Some(url) = self.session.connect_url() {
            return Some(url.to_string());
        }

        match self.rest.gateway_url().await {
            Ok(url) if !url.is_empty() => {
                self.session.set_gateway_url(url.clone());
                Some(url)
            }
            Ok(_) => {
                tracing::error!("Gateway endpoint resolution returned an empty URL");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve gateway endpoint");
                None
            }
        }
    }

    async fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::None => {}
            Directive::Hello { heartbeat_interval } => self.on_hello(heartbeat_interval),
            Directive::HeartbeatRequested => {
                if self.socket.is_connected() {
                    self.send_heartbeat(self.now).await;
                }
            }
            Directive::HeartbeatAck => self.heartbeat.record_ack(self.now),
            Directive::Reconnect => {
                tracing::info!("Gateway requested a reconnect");
                self.logout();
                self.login(self.intents).await;
            }
            Directive::InvalidSession { resumable } => {
                tracing::warn!(resumable, "Session invalidated");
                if resumable {
                    self.disconnect();
                } else {
                    self.logout();
                }
                self.login(self.intents).await;
            }
            Directive::Ready | Directive::Resumed => {
                self.state = ConnectionState::Connected;
            }
        }
    }

    fn on_hello(&mut self, heartbeat_interval: u64) {
        if self.state != ConnectionState::AwaitingHello {
            tracing::warn!(state = ?self.state, heartbeat_interval, "Ignoring unexpected Hello");
            return;
        }
        let now = self.now;
        self.heartbeat.start(heartbeat_interval, now);
        self.limiter.reset(now);

        let (frame, next) = match self.session.session_id() {
            Some(session_id) => (
                GatewayMessage::resume(&ResumePayload {
                    token: self.options.token.clone(),
                    session_id: session_id.to_string(),
                    seq: self.session.last_sequence(),
                }),
                ConnectionState::Resuming,
            ),
            None => (
                GatewayMessage::identify(&IdentifyPayload {
                    token: self.options.token.clone(),
                    intents: self.intents,
                    properties: self.options.properties.clone(),
                }),
                ConnectionState::Identifying,
            ),
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode handshake frame");
                self.disconnect();
                return;
            }
        };

        if self.send_frame(&frame, now) {
            tracing::info!(op = %frame.op, heartbeat_interval, "Handshake sent");
            self.state = next;
        } else {
            tracing::warn!(op = %frame.op, "Handshake frame not sent");
            self.disconnect();
        }
    }

    async fn send_heartbeat(&mut self, now: u64) {
        let frame = GatewayMessage::heartbeat(self.session.last_sequence());
        if !self.send_frame(&frame, now) {
            return;
        }
        self.heartbeat.record_send(now);

        if !self.rest.keepalive().await {
            tracing::debug!("REST keepalive failed");
        }
    }

    /// Send one frame through the rate limiter; `false` when it did not go out
    fn send_frame(&mut self, frame: &GatewayMessage, now: u64) -> bool {
        if !self.limiter.try_consume(now) {
            tracing::warn!(
                op = %frame.op,
                sent = self.limiter.sent_count(),
                "Outbound rate limit reached, frame not sent"
            );
            return false;
        }

        let text = match frame.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(op = %frame.op, error = %e, "Failed to encode frame");
                return false;
            }
        };

        if !self.socket.send_text(&text) {
            tracing::warn!(op = %frame.op, "Socket rejected frame");
            return false;
        }
        tracing::trace!(op = %frame.op, "Frame sent");
        true
    }

    fn on_closed(&mut self, code: Option<u16>, reason: &str) {
        match code.and_then(CloseCode::from_u16) {
            Some(close) => {
                if close.should_reconnect() {
                    tracing::warn!(code = %close, reason, "Gateway closed the connection");
                } else {
                    tracing::error!(
                        code = %close,
                        reason,
                        "Gateway closed the connection, reconnecting will fail until reconfigured"
                    );
                }
                if close.invalidates_session() {
                    self.session.clear_identity();
                }
            }
            None => tracing::warn!(code = ?code, reason, "Gateway connection closed"),
        }
        self.transport_lost();
    }

    /// The socket dropped: go offline, keep the session for a resume, re-resolve the endpoint
    fn transport_lost(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        tracing::warn!(state = ?self.state, "Gateway connection lost");
        self.disconnect();
        self.session.clear_gateway_url();
        self.session.clear_resume_url();
    }

    /// Close the socket and stop heartbeating, keeping the session identity
    fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected || self.socket.is_connected() {
            self.socket.close();
        }
        self.heartbeat.reset();
        self.state = ConnectionState::Disconnected;
        self.session.set_online(false);
    }
}
