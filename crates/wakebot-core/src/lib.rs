//! # wakebot-core
//!
//! Domain layer for the gateway client: identifiers, interaction and command models,
//! and the transport ports the gateway crate drives.
//! This crate has no network code of its own.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ApplicationCommand, ChoiceValue, CommandChoice, CommandOption, CommandType, InteractionReply,
    InteractionReplyData, InteractionResponseType, MessageResponse, OptionType,
    PendingInteraction,
};
pub use error::DomainError;
pub use traits::{
    GatewaySocket, HttpMethod, HttpRequest, HttpResponse, HttpTransport, SocketEvent,
    TransportError,
};
pub use value_objects::{MessageFlags, Snowflake, SnowflakeParseError};
