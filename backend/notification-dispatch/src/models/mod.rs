use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Authenticated user identity
pub type UserId = i64;

/// Domain category of a notification, as persisted by the service layer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationCategory {
    /// A watched product changed price
    PriceChange,
    /// Someone commented on the user's article
    NewComment,
    /// A category this build does not know about
    Unknown(String),
}

impl NotificationCategory {
    /// Every category this build recognizes
    pub const KNOWN: [NotificationCategory; 2] = [
        NotificationCategory::PriceChange,
        NotificationCategory::NewComment,
    ];

    /// Parse a persisted category string. Never fails: unrecognized values
    /// are kept verbatim in `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().replace('-', "_").to_ascii_uppercase();
        match normalized.as_str() {
            "PRICE_CHANGE" => NotificationCategory::PriceChange,
            "NEW_COMMENT" => NotificationCategory::NewComment,
            _ => NotificationCategory::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NotificationCategory::PriceChange => "PRICE_CHANGE",
            NotificationCategory::NewComment => "NEW_COMMENT",
            NotificationCategory::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, NotificationCategory::Unknown(_))
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NotificationCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(NotificationCategory::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChangeData {
    pub product_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentData {
    pub article_id: i64,
    pub comment_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
}

/// Notification payload, one variant per domain category
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationKind {
    PriceChange(PriceChangeData),
    NewComment(NewCommentData),
    Unknown { category: String, data: Value },
}

impl NotificationKind {
    /// Build a typed payload from a category string and loosely-typed data.
    ///
    /// Known categories require data matching their shape; unknown
    /// categories accept anything.
    pub fn from_parts(category: &str, data: Value) -> Result<Self> {
        match NotificationCategory::parse(category) {
            NotificationCategory::PriceChange => serde_json::from_value(data)
                .map(NotificationKind::PriceChange)
                .map_err(|e| AppError::BadRequest(format!("invalid PRICE_CHANGE data: {e}"))),
            NotificationCategory::NewComment => serde_json::from_value(data)
                .map(NotificationKind::NewComment)
                .map_err(|e| AppError::BadRequest(format!("invalid NEW_COMMENT data: {e}"))),
            NotificationCategory::Unknown(raw) => Ok(NotificationKind::Unknown {
                category: raw,
                data,
            }),
        }
    }

    pub fn category(&self) -> NotificationCategory {
        match self {
            NotificationKind::PriceChange(_) => NotificationCategory::PriceChange,
            NotificationKind::NewComment(_) => NotificationCategory::NewComment,
            NotificationKind::Unknown { category, .. } => {
                NotificationCategory::Unknown(category.clone())
            }
        }
    }

    /// Category-specific data as sent to clients
    pub fn data(&self) -> Value {
        let rendered = match self {
            NotificationKind::PriceChange(data) => serde_json::to_value(data),
            NotificationKind::NewComment(data) => serde_json::to_value(data),
            NotificationKind::Unknown { data, .. } => return data.clone(),
        };
        // Plain structs of integers and floats always serialize
        rendered.unwrap_or(Value::Null)
    }
}

/// A notification addressed to one user, as handed over by the service layer
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundNotification {
    /// Persisted record id, when the service layer stored one
    pub notification_id: Option<i64>,
    pub recipient_id: UserId,
    pub message: String,
    pub kind: NotificationKind,
}

impl OutboundNotification {
    pub fn new(recipient_id: UserId, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            notification_id: None,
            recipient_id,
            message: message.into(),
            kind,
        }
    }

    pub fn with_id(mut self, notification_id: i64) -> Self {
        self.notification_id = Some(notification_id);
        self
    }

    pub fn category(&self) -> NotificationCategory {
        self.kind.category()
    }

    /// JSON body delivered inside the wire event
    pub fn wire_payload(&self) -> Value {
        let mut body = Map::new();
        if let Some(id) = self.notification_id {
            body.insert("id".to_string(), json!(id));
        }
        body.insert("message".to_string(), json!(self.message));
        body.insert("data".to_string(), self.kind.data());
        Value::Object(body)
    }
}
