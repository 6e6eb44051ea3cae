/// Session Registry
///
/// Process-wide map from user identity to that user's live connection handles.
/// Supports:
/// - Multiple concurrent connections per user (one per tab/device)
/// - Precise per-handle removal on disconnect
/// - No empty entries: a user key exists only while it has a live handle
///
/// Insertion is reserved to the handshake path and removal to the lifecycle
/// path; everyone else gets read-only views.
use super::WebSocketMessage;
use crate::models::UserId;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Sender half feeding one socket's outbound frames
pub type ConnectionSender = mpsc::UnboundedSender<WebSocketMessage>;

/// Opaque identifier for one live duplex session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Result of inserting a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    /// The handle was already registered; nothing changed
    AlreadyPresent,
    /// The per-user cap is reached; nothing changed
    AtCapacity,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    /// user_id -> (connection_id -> sender)
    inner: Arc<DashMap<UserId, HashMap<ConnectionId, ConnectionSender>>>,
}

impl SessionRegistry {
    /// Create an empty registry. Called once at process start.
    pub fn create() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn add(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        sender: ConnectionSender,
    ) -> AddOutcome {
        self.add_with_limit(user_id, connection_id, sender, None)
    }

    /// Insert a handle unless the user already holds `limit` handles.
    ///
    /// The check and the insert happen under the same key lock.
    pub(crate) fn add_with_limit(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        sender: ConnectionSender,
        limit: Option<usize>,
    ) -> AddOutcome {
        match self.inner.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let handles = entry.get_mut();
                if handles.contains_key(&connection_id) {
                    return AddOutcome::AlreadyPresent;
                }
                if limit.is_some_and(|limit| handles.len() >= limit) {
                    return AddOutcome::AtCapacity;
                }
                handles.insert(connection_id, sender);
            }
            Entry::Vacant(entry) => {
                if limit == Some(0) {
                    return AddOutcome::AtCapacity;
                }
                let mut handles = HashMap::new();
                handles.insert(connection_id, sender);
                entry.insert(handles);
            }
        }

        tracing::debug!(
            user_id,
            connection_id = %connection_id,
            "registered connection handle"
        );
        AddOutcome::Inserted
    }

    /// Remove one handle; drops the user key when it was the last one.
    ///
    /// Returns whether the handle was present. Unknown users or handles are a
    /// no-op.
    pub(crate) fn remove(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        match self.inner.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let removed = entry.get_mut().remove(&connection_id).is_some();
                let remaining = entry.get().len();
                if remaining == 0 {
                    entry.remove();
                }
                if removed {
                    tracing::debug!(
                        user_id,
                        connection_id = %connection_id,
                        remaining,
                        "removed connection handle"
                    );
                }
                removed
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Live handles for a user; empty when the user is offline
    pub fn handles_for(&self, user_id: UserId) -> HashSet<ConnectionId> {
        self.inner
            .get(&user_id)
            .map(|handles| handles.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of delivery targets, taken without holding the key lock
    /// during sends
    pub(crate) fn senders_for(&self, user_id: UserId) -> Vec<(ConnectionId, ConnectionSender)> {
        self.inner
            .get(&user_id)
            .map(|handles| {
                handles
                    .iter()
                    .map(|(id, sender)| (*id, sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the user has an entry at all
    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.inner.contains_key(&user_id)
    }

    pub fn connection_count(&self, user_id: UserId) -> usize {
        self.inner.get(&user_id).map(|h| h.len()).unwrap_or(0)
    }

    pub fn total_connections(&self) -> usize {
        self.inner.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn connected_users_count(&self) -> usize {
        self.inner.len()
    }

    pub fn connected_user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.inner.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }
}
