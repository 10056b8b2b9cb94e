//! Integration test utilities for the gateway client
//!
//! In-memory stand-ins for the duplex socket and the HTTP transport, plus canned
//! gateway frames, so supervisor scenarios run without a network.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
