use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Minimum HS256 secret length in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub auth: AuthConfig,
    pub websocket: WebSocketConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Clock skew tolerance for `exp` in seconds (default: 30)
    pub leeway_secs: u64,
    /// Shared credential for the internal publish endpoint; when unset the
    /// endpoint refuses every request
    #[serde(skip_serializing)]
    pub internal_api_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
    /// Per-user cap on simultaneous sessions; `None` means unbounded
    pub max_connections_per_user: Option<usize>,
}

impl WebSocketConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 5,
            client_timeout_secs: 30,
            max_connections_per_user: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment (after `.env`, if present)
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| AppError::Config("JWT_SECRET is not set".to_string()))?;

        let config = Config {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "APP_PORT", 8000)?,
            },
            auth: AuthConfig {
                jwt_secret,
                leeway_secs: parse_or(&lookup, "JWT_LEEWAY_SECS", 30)?,
                internal_api_token: lookup("INTERNAL_API_TOKEN")
                    .map(|token| token.trim().to_string())
                    .filter(|token| !token.is_empty()),
            },
            websocket: WebSocketConfig {
                heartbeat_interval_secs: parse_or(&lookup, "WS_HEARTBEAT_INTERVAL_SECS", 5)?,
                client_timeout_secs: parse_or(&lookup, "WS_CLIENT_TIMEOUT_SECS", 30)?,
                max_connections_per_user: parse_optional(&lookup, "WS_MAX_CONNECTIONS_PER_USER")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::Config(format!(
                "JWT_SECRET too short: {} bytes (minimum {})",
                self.auth.jwt_secret.len(),
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.websocket.heartbeat_interval_secs == 0 {
            return Err(AppError::Config(
                "WS_HEARTBEAT_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.websocket.client_timeout_secs <= self.websocket.heartbeat_interval_secs {
            return Err(AppError::Config(
                "WS_CLIENT_TIMEOUT_SECS must exceed WS_HEARTBEAT_INTERVAL_SECS".to_string(),
            ));
        }
        if self.websocket.max_connections_per_user == Some(0) {
            return Err(AppError::Config(
                "WS_MAX_CONNECTIONS_PER_USER must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
    }
}
