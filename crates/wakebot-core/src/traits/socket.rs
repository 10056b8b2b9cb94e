//! Duplex gateway socket port

/// Something observed on the duplex connection since the last poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The connection finished its handshake
    Connected,
    /// A complete text frame
    Text(String),
    /// The connection closed, with the close code if the peer sent one
    Closed { code: Option<u16>, reason: String },
    /// Connecting or reading failed
    Error(String),
}

/// Non-blocking duplex connection to the gateway
///
/// Every method returns immediately: `open` only starts connecting, and `poll`
/// hands out whatever has already arrived.
pub trait GatewaySocket: Send {
    /// Start connecting to `url`, replacing any previous connection
    fn open(&mut self, url: &str);

    /// Take the next pending event, if any
    fn poll(&mut self) -> Option<SocketEvent>;

    /// Queue a text frame; false if the connection cannot take it
    fn send_text(&mut self, text: &str) -> bool;

    /// Whether the connection is currently established
    fn is_connected(&self) -> bool;

    /// Close the connection if open
    fn close(&mut self);
}
