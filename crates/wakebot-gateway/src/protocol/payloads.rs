//! Payload definitions
//!
//! The `d` members the client sends (Identify, Resume) and the few server
//! payloads it reads fields from. Everything else is forwarded as raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wakebot_common::BotToken;
use wakebot_core::{PendingInteraction, Snowflake};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Bot token, without the `Bot ` prefix
    pub token: BotToken,

    /// Gateway intents bit set
    pub intents: u64,

    /// Client connection properties
    pub properties: IdentifyProperties,
}

/// Client connection properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    pub os: String,

    /// Library name
    pub browser: String,

    /// Library name
    pub device: String,
}

impl IdentifyProperties {
    /// Properties describing the host this process runs on
    #[must_use]
    pub fn host() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: env!("CARGO_PKG_NAME").to_string(),
            device: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self::host()
    }
}

/// Payload for op 6 (Resume)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    /// Bot token, without the `Bot ` prefix
    pub token: BotToken,

    /// Session to resume
    pub session_id: String,

    /// Last sequence number received
    pub seq: Option<u64>,
}

/// `d` of the READY dispatch (only the fields the client keeps)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,

    /// Endpoint to use when resuming this session
    #[serde(default)]
    pub resume_gateway_url: Option<String>,

    #[serde(default)]
    pub application: Option<ReadyApplication>,
}

/// Partial application object carried by READY
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyApplication {
    pub id: Snowflake,
}

/// `d` of the INTERACTION_CREATE dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionPayload {
    pub id: Snowflake,
    pub token: String,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

/// Command data of an interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub id: Option<Snowflake>,
    #[serde(default)]
    pub name: String,
}

impl InteractionPayload {
    /// Turn the parsed payload into the pending slot value, keeping the full document
    #[must_use]
    pub fn into_pending(self, raw: Value) -> PendingInteraction {
        PendingInteraction {
            id: self.id,
            token: self.token,
            name: self.data.map(|d| d.name).unwrap_or_default(),
            raw,
        }
    }
}

/// `d` of the MESSAGE_CREATE dispatch (only the author is inspected)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageCreatePayload {
    #[serde(default)]
    pub author: Option<MessageAuthor>,
}

/// Author of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub id: Snowflake,
}

/// Response body of `GET /gateway`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayUrlPayload {
    pub url: String,
}
