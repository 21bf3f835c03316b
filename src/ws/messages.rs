//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server-originated message.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply with a numeric code.
    #[must_use]
    pub fn error(id: String, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send in the payload of a `command` message.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to audit events of specific cases.
    Subscribe {
        /// Case IDs to subscribe to. Use `["*"]` for every case and for
        /// system-level events.
        case_ids: Vec<String>,
    },
    /// Unsubscribe from specific cases.
    Unsubscribe {
        /// Case IDs to unsubscribe from.
        case_ids: Vec<String>,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_command_parses() {
        let Ok(cmd) = serde_json::from_value::<WsCommand>(
            serde_json::json!({ "command": "subscribe", "case_ids": ["c-1", "*"] }),
        ) else {
            panic!("should parse");
        };
        assert_eq!(
            cmd,
            WsCommand::Subscribe {
                case_ids: vec!["c-1".to_string(), "*".to_string()]
            }
        );
    }

    #[test]
    fn envelope_without_timestamp_parses() {
        let Ok(msg) = serde_json::from_str::<WsMessage>(
            r#"{"id":"1","type":"command","payload":{"command":"unsubscribe","case_ids":[]}}"#,
        ) else {
            panic!("should parse");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);
    }
}
