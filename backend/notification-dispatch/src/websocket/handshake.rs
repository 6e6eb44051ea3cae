/// Handshake Authenticator
///
/// Verifies the bearer credential of every connection attempt exactly once,
/// before the socket is established, and registers accepted connections.
use super::{
    ActiveConnection, AddOutcome, ConnectionId, ConnectionSender, ConnectionState, SessionRegistry,
};
use crate::auth::{TokenError, TokenVerifier};
use crate::error::AppError;
use crate::metrics;
use crate::models::UserId;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("missing credential")]
    MissingCredential,

    #[error("invalid credential: {0}")]
    InvalidCredential(TokenError),

    #[error("too many open connections (limit {limit})")]
    TooManyConnections { limit: usize },
}

impl HandshakeError {
    pub fn reason(&self) -> &'static str {
        match self {
            HandshakeError::MissingCredential => "missing",
            HandshakeError::InvalidCredential(err) => err.reason(),
            HandshakeError::TooManyConnections { .. } => "too_many_connections",
        }
    }

    /// A refused attempt ends in `Rejected`
    pub fn state(&self) -> ConnectionState {
        ConnectionState::Rejected
    }
}

impl From<HandshakeError> for AppError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::TooManyConnections { .. } => AppError::TooManyRequests(err.to_string()),
            HandshakeError::MissingCredential | HandshakeError::InvalidCredential(_) => {
                AppError::Unauthorized
            }
        }
    }
}

/// A verified connection attempt that is not registered yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConnection {
    pub id: ConnectionId,
    pub user_id: UserId,
}

impl PendingConnection {
    pub fn state(&self) -> ConnectionState {
        ConnectionState::Pending
    }
}

/// Pick the credential from the handshake: the `token` query parameter
/// wins over an `Authorization: Bearer` header (scheme matched
/// case-insensitively). Blank values count as absent.
pub fn extract_credential<'a>(
    query_token: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Option<&'a str> {
    query_token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .or_else(|| {
            authorization
                .and_then(|value| value.trim().split_once(' '))
                .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
                .map(|(_, token)| token.trim())
                .filter(|token| !token.is_empty())
        })
}

#[derive(Clone)]
pub struct HandshakeAuthenticator {
    verifier: Arc<dyn TokenVerifier>,
    registry: SessionRegistry,
    max_connections_per_user: Option<usize>,
}

impl HandshakeAuthenticator {
    pub fn new(verifier: Arc<dyn TokenVerifier>, registry: SessionRegistry) -> Self {
        Self {
            verifier,
            registry,
            max_connections_per_user: None,
        }
    }

    pub fn with_connection_limit(mut self, limit: Option<usize>) -> Self {
        self.max_connections_per_user = limit;
        self
    }

    /// Verify the credential of a new connection attempt.
    ///
    /// Never mutates the registry.
    pub fn authenticate(
        &self,
        credential: Option<&str>,
    ) -> Result<PendingConnection, HandshakeError> {
        let result = self.check(credential);
        match &result {
            Ok(pending) => {
                tracing::info!(
                    user_id = pending.user_id,
                    connection_id = %pending.id,
                    "websocket handshake authenticated"
                );
            }
            Err(err) => {
                metrics::handshake_rejected(err.reason());
                tracing::warn!(
                    reason = err.reason(),
                    state = ?err.state(),
                    error = %err,
                    "websocket handshake rejected"
                );
            }
        }
        result
    }

    fn check(&self, credential: Option<&str>) -> Result<PendingConnection, HandshakeError> {
        let token = credential.ok_or(HandshakeError::MissingCredential)?;
        let user_id = self
            .verifier
            .verify(token)
            .map_err(HandshakeError::InvalidCredential)?;

        if let Some(limit) = self.max_connections_per_user {
            if self.registry.connection_count(user_id) >= limit {
                return Err(HandshakeError::TooManyConnections { limit });
            }
        }

        Ok(PendingConnection {
            id: ConnectionId::new(),
            user_id,
        })
    }

    /// Register an accepted connection under its verified user.
    ///
    /// Fails only if the per-user cap filled up between `authenticate` and
    /// accept.
    pub fn accept(
        &self,
        pending: PendingConnection,
        sender: ConnectionSender,
    ) -> Result<ActiveConnection, HandshakeError> {
        let outcome = self.registry.add_with_limit(
            pending.user_id,
            pending.id,
            sender,
            self.max_connections_per_user,
        );

        match outcome {
            AddOutcome::Inserted => {
                metrics::connection_opened();
                Ok(ActiveConnection::new(pending.id, pending.user_id))
            }
            AddOutcome::AlreadyPresent => Ok(ActiveConnection::new(pending.id, pending.user_id)),
            AddOutcome::AtCapacity => {
                let err = HandshakeError::TooManyConnections {
                    limit: self.max_connections_per_user.unwrap_or_default(),
                };
                metrics::handshake_rejected(err.reason());
                tracing::warn!(
                    user_id = pending.user_id,
                    connection_id = %pending.id,
                    "connection limit reached at accept"
                );
                Err(err)
            }
        }
    }
}
