//! Gateway protocol definitions
//!
//! Defines the duplex protocol including op codes, frame format, payloads, and close codes.

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{
    GatewayUrlPayload, HelloPayload, IdentifyPayload, IdentifyProperties, InteractionData,
    InteractionPayload, MessageAuthor, MessageCreatePayload, ReadyApplication, ReadyPayload,
    ResumePayload,
};
