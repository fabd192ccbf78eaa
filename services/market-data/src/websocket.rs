//! WebSocket client protocol
//!
//! Subscriptions are implicit in the route (`/ws/orderbook/`,
//! `/ws/trades/`); inbound traffic is limited to a JSON liveness exchange:
//! `{"type": "ping"}` answered with `{"type": "pong"}`. Anything else gets
//! a typed error so misbehaving clients can see what went wrong.

use serde::{Deserialize, Serialize};

/// Inbound client message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub message_type: String,
}

/// Outbound protocol reply (pong or error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolReply {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProtocolReply {
    fn pong() -> Self {
        Self {
            message_type: "pong".to_string(),
            message: None,
        }
    }

    fn error(message: &str) -> Self {
        Self {
            message_type: "error".to_string(),
            message: Some(message.to_string()),
        }
    }
}

/// Handle one inbound text frame, returning the JSON reply to send.
pub fn handle_client_text(text: &str) -> String {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) if message.message_type == "ping" => ProtocolReply::pong(),
        Ok(_) => ProtocolReply::error("Unknown message type"),
        Err(_) => ProtocolReply::error("Invalid JSON"),
    };
    serde_json::to_string(&reply).expect("protocol replies serialize")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_gets_pong() {
        let reply = handle_client_text(r#"{"type":"ping"}"#);
        assert_eq!(reply, r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_unknown_type_gets_error() {
        let reply = handle_client_text(r#"{"type":"subscribe"}"#);
        let parsed: ProtocolReply = serde_json::from_str(&reply).unwrap();
        assert_eq!(parsed.message_type, "error");
        assert_eq!(parsed.message.as_deref(), Some("Unknown message type"));
    }

    #[test]
    fn test_invalid_json_gets_error() {
        let reply = handle_client_text("not json at all");
        let parsed: ProtocolReply = serde_json::from_str(&reply).unwrap();
        assert_eq!(parsed.message_type, "error");
        assert_eq!(parsed.message.as_deref(), Some("Invalid JSON"));
    }
}
