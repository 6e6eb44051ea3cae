/// Domain category to wire event mapping
use crate::models::NotificationCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event classes exposed to WebSocket clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireEvent {
    /// System-level notices (price changes)
    System,
    /// Conversational notices (comments)
    Chat,
    /// Default class for categories without a dedicated event
    Notification,
}

impl WireEvent {
    pub const DEFAULT: WireEvent = WireEvent::Notification;

    pub fn as_str(&self) -> &'static str {
        match self {
            WireEvent::System => "system",
            WireEvent::Chat => "chat",
            WireEvent::Notification => "notification",
        }
    }
}

impl fmt::Display for WireEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the wire event for a domain category. Total: unknown categories
/// fall back to [`WireEvent::DEFAULT`].
pub fn map_to_wire_event(category: &NotificationCategory) -> WireEvent {
    match category {
        NotificationCategory::PriceChange => WireEvent::System,
        NotificationCategory::NewComment => WireEvent::Chat,
        NotificationCategory::Unknown(raw) => {
            tracing::warn!(
                category = %raw,
                fallback = %WireEvent::DEFAULT,
                "unrecognized notification category, using default wire event"
            );
            WireEvent::DEFAULT
        }
    }
}
