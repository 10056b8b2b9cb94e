//! Canned gateway frames and REST bodies

use serde_json::{json, Value};

pub const API_BASE: &str = "https://api.test/v10";
pub const GATEWAY_URL: &str = "wss://gateway.test";
pub const RESUME_URL: &str = "wss://resume.test";
pub const GATEWAY_QUERY: &str = "/?v=10&encoding=json";
pub const TOKEN: &str = "test-token";
pub const APPLICATION_ID: u64 = 4242;
pub const SESSION_ID: &str = "session-1";
pub const HEARTBEAT_INTERVAL: u64 = 40_000;

/// Body of `GET /gateway`
pub fn gateway_body() -> String {
    json!({ "url": GATEWAY_URL }).to_string()
}

pub fn hello(heartbeat_interval: u64) -> Value {
    json!({ "op": 10, "d": { "heartbeat_interval": heartbeat_interval } })
}

pub fn heartbeat_request() -> Value {
    json!({ "op": 1, "d": null })
}

pub fn heartbeat_ack() -> Value {
    json!({ "op": 11 })
}

pub fn reconnect() -> Value {
    json!({ "op": 7, "d": null })
}

pub fn invalid_session(resumable: bool) -> Value {
    json!({ "op": 9, "d": resumable })
}

pub fn dispatch(name: &str, seq: u64, data: Value) -> Value {
    json!({ "op": 0, "t": name, "s": seq, "d": data })
}

pub fn ready(seq: u64) -> Value {
    dispatch(
        "READY",
        seq,
        json!({
            "v": 10,
            "session_id": SESSION_ID,
            "resume_gateway_url": RESUME_URL,
            "user": { "id": APPLICATION_ID.to_string(), "username": "wakebot", "bot": true },
            "application": { "id": APPLICATION_ID.to_string(), "flags": 0 }
        }),
    )
}

pub fn resumed(seq: u64) -> Value {
    dispatch("RESUMED", seq, Value::Null)
}

pub fn message_create(seq: u64, author_id: u64, content: &str) -> Value {
    dispatch(
        "MESSAGE_CREATE",
        seq,
        json!({
            "id": "1100",
            "channel_id": "1200",
            "content": content,
            "author": { "id": author_id.to_string(), "username": "someone" }
        }),
    )
}

pub fn interaction_create(seq: u64, id: u64, token: &str, command: &str) -> Value {
    dispatch(
        "INTERACTION_CREATE",
        seq,
        json!({
            "id": id.to_string(),
            "application_id": APPLICATION_ID.to_string(),
            "type": 2,
            "token": token,
            "data": { "id": "900", "name": command, "type": 1 },
            "user": { "id": "77", "username": "invoker" }
        }),
    )
}
