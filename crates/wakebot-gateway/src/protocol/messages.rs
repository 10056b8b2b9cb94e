//! Gateway frame format
//!
//! Every frame on the duplex connection is `{op, t, s, d}`.

use super::{HelloPayload, IdentifyPayload, OpCode, ResumePayload};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event name (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload, `null` when absent
    #[serde(default)]
    pub d: Value,
}

impl GatewayMessage {
    fn bare(op: OpCode, d: Value) -> Self {
        Self { op, t: None, s: None, d }
    }

    // === Client Frames ===

    /// Create a Heartbeat frame (op=1) carrying the last sequence, or `null` before any dispatch
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self::bare(OpCode::Heartbeat, last_sequence.map_or(Value::Null, Value::from))
    }

    /// Create an Identify frame (op=2)
    pub fn identify(payload: &IdentifyPayload) -> Result<Self, serde_json::Error> {
        Ok(Self::bare(OpCode::Identify, serde_json::to_value(payload)?))
    }

    /// Create a Resume frame (op=6)
    pub fn resume(payload: &ResumePayload) -> Result<Self, serde_json::Error> {
        Ok(Self::bare(OpCode::Resume, serde_json::to_value(payload)?))
    }

    // === Parsing ===

    /// Decode `d` into a typed payload
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.d)
    }

    /// Try to parse as a Hello payload (op=10)
    pub fn as_hello(&self) -> Option<HelloPayload> {
        if self.op != OpCode::Hello {
            return None;
        }
        self.data().ok()
    }

    /// Try to parse the resumable flag of an Invalid Session frame (op=9)
    ///
    /// A missing or non-boolean `d` counts as not resumable.
    pub fn as_invalid_session(&self) -> Option<bool> {
        if self.op != OpCode::InvalidSession {
            return None;
        }
        Some(self.d.as_bool().unwrap_or(false))
    }

    // === Utilities ===

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::IdentifyProperties;
    use serde_json::json;
    use wakebot_common::BotToken;

    #[test]
    fn test_heartbeat_frame() {
        assert_eq!(
            GatewayMessage::heartbeat(Some(41)).to_json().unwrap(),
            r#"{"op":1,"d":41}"#
        );
        assert_eq!(
            GatewayMessage::heartbeat(None).to_json().unwrap(),
            r#"{"op":1,"d":null}"#
        );
    }

    #[test]
    fn test_identify_frame() {
        let payload = IdentifyPayload {
            token: BotToken::new("tok"),
            intents: 4096,
            properties: IdentifyProperties::host(),
        };
        let frame = GatewayMessage::identify(&payload).unwrap();
        let value: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();

        assert_eq!(value["op"], 2);
        assert_eq!(value["d"]["token"], "tok");
        assert_eq!(value["d"]["intents"], 4096);
        assert!(value.get("t").is_none());
    }

    #[test]
    fn test_resume_frame() {
        let payload = ResumePayload {
            token: BotToken::new("tok"),
            session_id: "abc".to_string(),
            seq: Some(7),
        };
        let frame = GatewayMessage::resume(&payload).unwrap();
        let value: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"op": 6, "d": {"token": "tok", "session_id": "abc", "seq": 7}}));
    }

    #[test]
    fn test_parse_server_hello() {
        let msg = GatewayMessage::from_json(
            r#"{"t":null,"s":null,"op":10,"d":{"heartbeat_interval":41250,"_trace":["gw"]}}"#,
        )
        .unwrap();

        assert_eq!(msg.op, OpCode::Hello);
        assert!(msg.t.is_none());
        assert_eq!(msg.as_hello().unwrap().heartbeat_interval, 41250);
        assert!(msg.as_invalid_session().is_none());
    }

    #[test]
    fn test_parse_dispatch() {
        let msg = GatewayMessage::from_json(
            r#"{"t":"MESSAGE_CREATE","s":42,"op":0,"d":{"id":"1","content":"hi"}}"#,
        )
        .unwrap();

        assert_eq!(msg.op, OpCode::Dispatch);
        assert_eq!(msg.t.as_deref(), Some("MESSAGE_CREATE"));
        assert_eq!(msg.s, Some(42));
        assert_eq!(msg.d["content"], "hi");
    }

    #[test]
    fn test_invalid_session_flag() {
        let resumable = GatewayMessage::from_json(r#"{"op":9,"d":true}"#).unwrap();
        assert_eq!(resumable.as_invalid_session(), Some(true));
        let fresh = GatewayMessage::from_json(r#"{"op":9,"d":false}"#).unwrap();
        assert_eq!(fresh.as_invalid_session(), Some(false));

        let missing = GatewayMessage::from_json(r#"{"op":9}"#).unwrap();
        assert_eq!(missing.as_invalid_session(), Some(false));
    }

    #[test]
    fn test_unknown_opcode_is_rejected() {
        assert!(GatewayMessage::from_json(r#"{"op":5,"d":null}"#).is_err());
        assert!(GatewayMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_message_display() {
        let dispatch =
            GatewayMessage::from_json(r#"{"op":0,"t":"READY","s":1,"d":{}}"#).unwrap();
        let display = format!("{dispatch}");
        assert!(display.contains("READY"));
        assert!(display.contains("s=1"));

        assert_eq!(
            format!("{}", GatewayMessage::heartbeat(None)),
            "GatewayMessage(op=Heartbeat (1))"
        );
    }
}
