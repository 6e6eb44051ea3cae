/// HTTP handlers for the notification dispatch service
pub mod guards;
pub mod websocket;

pub use guards::{InternalCaller, INTERNAL_TOKEN_HEADER};
pub use websocket::register_routes as register_websocket;
