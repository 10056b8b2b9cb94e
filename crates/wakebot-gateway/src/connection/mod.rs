//! Connection supervision
//!
//! The client state machine and the bookkeeping it owns: session identity,
//! heartbeat timing, and the outbound send budget.

mod client;
mod heartbeat;
mod rate_limit;
mod session;

pub use client::{ConnectionState, GatewayClient, GatewayOptions};
pub use heartbeat::HeartbeatScheduler;
pub use rate_limit::RateLimiter;
pub use session::Session;
