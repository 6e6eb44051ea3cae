/// Request guards for the internal API
use crate::error::AppError;
use crate::state::AppState;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

/// Header carrying the shared service-to-service credential
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// A caller holding the internal API token.
///
/// Extraction fails with 401 when the header is missing or wrong, and for
/// every request when no token is configured.
#[derive(Debug, Clone, Copy)]
pub struct InternalCaller;

impl FromRequest for InternalCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let expected = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.config.auth.internal_api_token.clone());
        let presented = req
            .headers()
            .get(INTERNAL_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        let result = match (expected, presented) {
            (Some(expected), Some(presented)) if expected == presented.trim() => Ok(InternalCaller),
            (None, _) => {
                tracing::warn!(path = req.path(), "internal API token not configured");
                Err(AppError::Unauthorized)
            }
            _ => {
                tracing::warn!(path = req.path(), "rejected internal API call");
                Err(AppError::Unauthorized)
            }
        };
        ready(result)
    }
}
