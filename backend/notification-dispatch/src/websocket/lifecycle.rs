/// Connection lifecycle: per-handle state and close-time cleanup
use super::{ConnectionId, SessionRegistry};
use crate::metrics;
use crate::models::UserId;
use std::fmt;

/// State of one connection handle.
///
/// `Pending -> Rejected` or `Pending -> Active -> Closed`. A
/// `PendingConnection` is `Pending`, a `HandshakeError` is `Rejected`, and an
/// `ActiveConnection` is `Active` until closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake received, credential not yet verified
    Pending,
    /// Credential refused; terminal
    Rejected,
    /// Registered and eligible for delivery
    Active,
    /// Removed from the registry; terminal
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ClientClosed,
    ServerClosed,
    TransportError,
    HeartbeatTimeout,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::ClientClosed => "client_closed",
            CloseReason::ServerClosed => "server_closed",
            CloseReason::TransportError => "transport_error",
            CloseReason::HeartbeatTimeout => "heartbeat_timeout",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted connection bound to its owning user for its whole lifetime
#[derive(Debug)]
pub struct ActiveConnection {
    id: ConnectionId,
    user_id: UserId,
    state: ConnectionState,
}

impl ActiveConnection {
    pub(crate) fn new(id: ConnectionId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            state: ConnectionState::Active,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

#[derive(Clone)]
pub struct LifecycleManager {
    registry: SessionRegistry,
}

impl LifecycleManager {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Handle the transport's closure signal for `connection`.
    ///
    /// Only the first call for a connection does anything; it returns
    /// `true`. Later calls return `false`.
    pub fn close(&self, connection: &mut ActiveConnection, reason: CloseReason) -> bool {
        if connection.state != ConnectionState::Active {
            tracing::debug!(
                user_id = connection.user_id,
                connection_id = %connection.id,
                state = ?connection.state,
                "ignoring close for inactive connection"
            );
            return false;
        }

        connection.state = ConnectionState::Closed;
        let removed = self.registry.remove(connection.user_id, connection.id);
        if removed {
            metrics::connection_closed();
        }

        tracing::info!(
            user_id = connection.user_id,
            connection_id = %connection.id,
            reason = %reason,
            removed,
            "connection closed"
        );
        true
    }
}
