pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod websocket;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::*;
pub use state::AppState;
pub use websocket::{Publisher, SessionRegistry, WebSocketMessage, WireEvent};
