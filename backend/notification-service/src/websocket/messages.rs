/// WebSocket frames exchanged with admin dashboards
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    /// Named server event, e.g. `userAdded` with the notification record
    Event {
        event: String,
        payload: serde_json::Value,
    },

    /// Heartbeat/ping from server
    Ping { timestamp: i64 },

    /// Client responds to ping
    Pong { timestamp: i64 },

    Error { code: String, message: String },

    /// Connection established confirmation
    Connected {
        connection_id: Uuid,
        server_id: String,
        timestamp: i64,
    },
}

impl WebSocketMessage {
    pub fn event(event: impl Into<String>, payload: serde_json::Value) -> Self {
        WebSocketMessage::Event {
            event: event.into(),
            payload,
        }
    }

    pub fn pong(timestamp: i64) -> Self {
        WebSocketMessage::Pong { timestamp }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        WebSocketMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn connected(connection_id: Uuid) -> Self {
        WebSocketMessage::Connected {
            connection_id,
            server_id: std::env::var("HOSTNAME").unwrap_or_else(|_| "notification-service".into()),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_frame_shape() {
        let msg = WebSocketMessage::event("userAdded", serde_json::json!({ "read": false }));
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "Event");
        assert_eq!(value["event"], "userAdded");
        assert_eq!(value["payload"]["read"], false);
    }

    #[test]
    fn test_pong_parses_from_client_json() {
        let parsed = WebSocketMessage::from_json(r#"{"type":"Pong","timestamp":42}"#).unwrap();
        assert_eq!(parsed, WebSocketMessage::pong(42));
    }

    #[test]
    fn test_unknown_frame_is_rejected() {
        assert!(WebSocketMessage::from_json(r#"{"type":"Subscribe"}"#).is_err());
    }
}
