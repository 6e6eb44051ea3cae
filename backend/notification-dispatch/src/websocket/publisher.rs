/// Publisher
///
/// Emits a frame to every live handle of one user. Fire-and-forget: no
/// acknowledgement, no retry, and a failed send never prunes the registry
/// (closure is the lifecycle path's job).
use super::{SessionRegistry, WebSocketMessage, WireEvent};
use crate::metrics;
use crate::models::UserId;

#[derive(Clone)]
pub struct Publisher {
    registry: SessionRegistry,
}

impl Publisher {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Send `event` with `payload` to each of the user's handles.
    ///
    /// Returns how many handles accepted the frame. A user with no live
    /// sessions yields 0 and is not an error.
    pub fn publish(&self, user_id: UserId, event: WireEvent, payload: serde_json::Value) -> usize {
        let targets = self.registry.senders_for(user_id);
        if targets.is_empty() {
            tracing::debug!(user_id, event = %event, "user offline, skipping live delivery");
            return 0;
        }

        let message = WebSocketMessage::event(event, payload);
        let mut delivered = 0;
        for (connection_id, sender) in targets {
            match sender.send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::debug!(
                        user_id,
                        connection_id = %connection_id,
                        "send to closing connection failed"
                    );
                }
            }
        }

        metrics::record_published(event, delivered);
        tracing::debug!(user_id, event = %event, delivered, "published notification");
        delivered
    }
}
