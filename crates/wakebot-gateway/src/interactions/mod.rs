//! Command interactions
//!
//! Replying to the pending interaction, and registering the commands that produce them.

mod commands;
mod responder;

pub use commands::CommandRegistry;
pub use responder::{
    InteractionResponder, ResourceProbe, WorkerHeadroom, OVERLOAD_WARNING, REPLY_DEADLINE,
};
