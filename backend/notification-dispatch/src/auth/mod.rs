//! Bearer credential verification.
//!
//! The WebSocket handshake only depends on the [`TokenVerifier`] contract;
//! [`JwtVerifier`] is the production implementation shared with the HTTP
//! auth layer.

pub mod jwt;

pub use jwt::{Claims, JwtVerifier};

use crate::models::UserId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token invalid: {0}")]
    Invalid(String),
}

impl TokenError {
    /// Short label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Expired => "expired",
            TokenError::Invalid(_) => "invalid",
        }
    }
}

/// Resolves a bearer credential to the user it was issued for.
///
/// Implementations must be local and synchronous (no network round-trip).
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserId, TokenError>;
}
