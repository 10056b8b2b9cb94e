//! Interaction entities
//!
//! The pending command invocation and the reply documents sent back for it.

use crate::value_objects::{MessageFlags, Snowflake};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The most recently received command invocation that still awaits its reply
///
/// Single slot: a newer interaction replaces an unanswered older one.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInteraction {
    /// Interaction id
    pub id: Snowflake,
    /// Continuation token used to address the reply
    pub token: String,
    /// Invoked command name
    pub name: String,
    /// The full interaction object as received
    pub raw: Value,
}

impl PendingInteraction {
    /// Whether a reply can be addressed to this interaction
    pub fn is_answerable(&self) -> bool {
        !self.id.is_zero() && !self.token.is_empty()
    }

    /// Id of the user who invoked the command
    ///
    /// Guild invocations carry the user under `member.user`, direct messages under `user`.
    pub fn invoker_id(&self) -> Option<Snowflake> {
        let user = self
            .raw
            .get("member")
            .and_then(|m| m.get("user"))
            .or_else(|| self.raw.get("user"))?;
        serde_json::from_value(user.get("id")?.clone()).ok()
    }
}

/// Interaction callback types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InteractionResponseType {
    /// ACK a Ping
    Pong = 1,
    /// Respond to an interaction with a message
    ChannelMessageWithSource = 4,
    /// ACK an interaction and edit a response later, the user sees a loading state
    DeferredChannelMessageWithSource = 5,
    /// Components: ACK and edit the original message later, no loading state
    DeferredUpdateMessage = 6,
    /// Components: edit the message the component was attached to
    UpdateMessage = 7,
    /// Respond to an autocomplete interaction with suggested choices
    ApplicationCommandAutocompleteResult = 8,
    /// Respond to an interaction with a popup modal
    Modal = 9,
}

impl InteractionResponseType {
    /// Create from a raw integer value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Pong),
            4 => Some(Self::ChannelMessageWithSource),
            5 => Some(Self::DeferredChannelMessageWithSource),
            6 => Some(Self::DeferredUpdateMessage),
            7 => Some(Self::UpdateMessage),
            8 => Some(Self::ApplicationCommandAutocompleteResult),
            9 => Some(Self::Modal),
            _ => None,
        }
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Serialize for InteractionResponseType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for InteractionResponseType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid interaction response type: {value}"))
        })
    }
}

/// Message content of a reply, as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageResponse {
    /// Text-to-speech
    pub tts: bool,
    /// Message text
    pub content: String,
    /// Message flags
    pub flags: MessageFlags,
}

impl MessageResponse {
    /// A plain text reply
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set the message flags
    #[must_use]
    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Reply document posted to the interaction callback endpoint
///
/// `{type, data: {tts?, content, flags?}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionReply {
    #[serde(rename = "type")]
    pub kind: InteractionResponseType,
    pub data: InteractionReplyData,
}

/// The `data` member of an [`InteractionReply`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionReplyData {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tts: bool,
    pub content: String,
    #[serde(default, skip_serializing_if = "MessageFlags::is_empty")]
    pub flags: MessageFlags,
}

impl InteractionReply {
    /// Build a reply document from a message response
    #[must_use]
    pub fn new(kind: InteractionResponseType, message: MessageResponse) -> Self {
        Self {
            kind,
            data: InteractionReplyData {
                tts: message.tts,
                content: message.content,
                flags: message.flags,
            },
        }
    }
}
