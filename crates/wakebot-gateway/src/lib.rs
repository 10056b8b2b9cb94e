//! # wakebot-gateway
//!
//! Client for the platform's real-time gateway: a supervised duplex connection
//! with heartbeats, resume, and outbound rate limiting, plus the REST channel used
//! for bootstrap and for replies to command interactions.

pub mod connection;
pub mod events;
pub mod handlers;
pub mod interactions;
pub mod protocol;
pub mod rest;
pub mod transport;

pub use connection::{
    ConnectionState, GatewayClient, GatewayOptions, HeartbeatScheduler, RateLimiter, Session,
};
pub use events::{DispatchEvent, EventHandler, GatewayEventType};
pub use handlers::{Directive, EventDispatcher};
pub use interactions::{CommandRegistry, InteractionResponder, ResourceProbe, WorkerHeadroom};
pub use rest::{RestError, RestGateway, RestRequest, RestResult};
pub use transport::{ReqwestTransport, SocketError, WsSocket};
