//! Transport traits (ports) - define the I/O the gateway client needs
//!
//! The domain layer defines what it needs, and the gateway crate provides
//! the network implementations. Tests substitute in-memory doubles.

mod http;
mod socket;

pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use socket::{GatewaySocket, SocketEvent};
