//! REST channel
//!
//! One shared HTTP transport used for bootstrap, keepalive, command registration,
//! and interaction replies.

mod error;
mod gateway;

pub use error::RestError;
pub use gateway::{RestGateway, RestRequest, RestResult};
