/// Service-layer entry point into real-time delivery
///
/// Application code (price updates, new comments) hands over an
/// [`OutboundNotification`]; the dispatcher resolves the wire event and
/// publishes to the recipient's live sessions. Persistence and the
/// offline query path live elsewhere.
use crate::models::{OutboundNotification, UserId};
use crate::websocket::{map_to_wire_event, Publisher, WireEvent};
use serde::Serialize;

/// Outcome of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub recipient_id: UserId,
    pub wire_event: WireEvent,
    /// Number of live sessions the frame was handed to
    pub delivered: usize,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    publisher: Publisher,
}

impl NotificationDispatcher {
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }

    pub fn dispatch(&self, notification: &OutboundNotification) -> DispatchReport {
        let wire_event = map_to_wire_event(&notification.category());
        let delivered = self.publisher.publish(
            notification.recipient_id,
            wire_event,
            notification.wire_payload(),
        );

        tracing::info!(
            recipient_id = notification.recipient_id,
            category = %notification.category(),
            wire_event = %wire_event,
            delivered,
            "dispatched notification"
        );

        DispatchReport {
            recipient_id: notification.recipient_id,
            wire_event,
            delivered,
        }
    }
}
