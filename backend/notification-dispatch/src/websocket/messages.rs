/// WebSocket frame types for real-time notifications
use super::{ConnectionId, WireEvent};
use crate::models::UserId;
use actix::Message;
use serde::{Deserialize, Serialize};

/// JSON frames exchanged over a notification socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Message)]
#[serde(tag = "type", rename_all = "snake_case")]
#[rtype(result = "()")]
pub enum WebSocketMessage {
    /// Server pushes a notification event to the client
    Event {
        event: WireEvent,
        payload: serde_json::Value,
    },

    /// Connection accepted and registered
    Connected {
        connection_id: ConnectionId,
        user_id: UserId,
        timestamp: i64,
    },

    /// Application-level heartbeat from the client
    Ping { timestamp: i64 },

    /// Reply to a client ping
    Pong { timestamp: i64 },

    /// Error message from server
    Error { code: String, message: String },
}

impl WebSocketMessage {
    pub fn event(event: WireEvent, payload: serde_json::Value) -> Self {
        WebSocketMessage::Event { event, payload }
    }

    pub fn connected(connection_id: ConnectionId, user_id: UserId) -> Self {
        WebSocketMessage::Connected {
            connection_id,
            user_id,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn ping() -> Self {
        WebSocketMessage::Ping {
            timestamp: chrono::Utc::now().timestamp(),
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

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
