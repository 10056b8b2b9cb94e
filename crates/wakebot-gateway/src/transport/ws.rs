//! Duplex socket backed by tokio-tungstenite
//!
//! `open` spawns one task that owns the connection. Inbound frames and state
//! changes reach the client through a channel drained by `poll`; outbound text is
//! queued on a second channel, so none of the socket methods ever wait on I/O.

use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use wakebot_core::{GatewaySocket, SocketEvent};

/// Connection attempts that take longer than this are reported as errors
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures reported by [`WsSocket`] as [`SocketEvent::Error`]
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("No async runtime available to open the socket")]
    NoRuntime,

    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl From<SocketError> for SocketEvent {
    fn from(err: SocketError) -> Self {
        SocketEvent::Error(err.to_string())
    }
}

/// Gateway socket over a TLS WebSocket
pub struct WsSocket {
    events: Option<mpsc::UnboundedReceiver<SocketEvent>>,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    connected: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    connect_timeout: Duration,
}

impl WsSocket {
    /// Create a closed socket
    #[must_use]
    pub fn new() -> Self {
        Self::with_connect_timeout(DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a closed socket with a custom connect timeout
    #[must_use]
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self {
            events: None,
            outbound: None,
            connected: Arc::new(AtomicBool::new(false)),
            task: None,
            connect_timeout,
        }
    }
}

impl Default for WsSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewaySocket for WsSocket {
    fn open(&mut self, url: &str) {
        self.close();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.events = Some(event_rx);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let _ = event_tx.send(SocketError::NoRuntime.into());
            return;
        };

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        self.outbound = Some(out_tx);
        self.connected = Arc::clone(&connected);

        tracing::debug!(url = %url, "Opening gateway socket");
        self.task = Some(runtime.spawn(run(
            url.to_string(),
            event_tx,
            out_rx,
            connected,
            self.connect_timeout,
        )));
    }

    fn poll(&mut self) -> Option<SocketEvent> {
        self.events.as_mut()?.try_recv().ok()
    }

    fn send_text(&mut self, text: &str) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.outbound
            .as_ref()
            .is_some_and(|tx| tx.send(Message::Text(text.to_string())).is_ok())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        let was_connected = self.connected.swap(false, Ordering::SeqCst);
        self.events = None;

        if let Some(tx) = self.outbound.take() {
            if was_connected {
                // The connection task sends the close frame and exits
                let _ = tx.send(Message::Close(None));
            }
        }
        if let Some(task) = self.task.take() {
            if !was_connected {
                task.abort();
            }
        }
    }
}

impl Drop for WsSocket {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run(
    url: String,
    events: mpsc::UnboundedSender<SocketEvent>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    connected: Arc<AtomicBool>,
    connect_timeout: Duration,
) {
    let stream = match tokio::time::timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Gateway connect failed");
            let _ = events.send(SocketError::from(e).into());
            return;
        }
        Err(_) => {
            let _ = events.send(SocketError::ConnectTimeout(connect_timeout).into());
            return;
        }
    };

    connected.store(true, Ordering::SeqCst);
    let _ = events.send(SocketEvent::Connected);

    let (mut sink, mut stream) = stream.split();

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(SocketEvent::Text(text));
                }
                Some(Ok(Message::Close(frame))) => {
                    connected.store(false, Ordering::SeqCst);
                    let (code, reason) = frame
                        .map(|f| (Some(u16::from(f.code)), f.reason.into_owned()))
                        .unwrap_or_default();
                    let _ = events.send(SocketEvent::Closed { code, reason });
                    break;
                }
                // Pings are answered by tungstenite; the gateway sends no binary frames with json encoding
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    connected.store(false, Ordering::SeqCst);
                    let _ = events.send(SocketError::from(e).into());
                    break;
                }
                None => {
                    connected.store(false, Ordering::SeqCst);
                    let _ = events.send(SocketEvent::Closed {
                        code: None,
                        reason: "stream ended".to_string(),
                    });
                    break;
                }
            },
            outgoing = outbound.recv() => match outgoing {
                Some(message) => {
                    let closing = matches!(message, Message::Close(_));
                    if let Err(e) = sink.send(message).await {
                        connected.store(false, Ordering::SeqCst);
                        let _ = events.send(SocketError::from(e).into());
                        break;
                    }
                    if closing {
                        break;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    connected.store(false, Ordering::SeqCst);
}
