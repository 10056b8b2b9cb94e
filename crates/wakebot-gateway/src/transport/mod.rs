//! Concrete transports
//!
//! tokio-tungstenite for the duplex connection, reqwest for the REST channel.

mod http;
mod ws;

pub use http::ReqwestTransport;
pub use ws::{SocketError, WsSocket};
