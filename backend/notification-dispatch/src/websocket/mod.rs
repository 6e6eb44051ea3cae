/// WebSocket real-time notification core
///
/// Architecture:
/// 1. SessionRegistry: user -> live connection handles
/// 2. HandshakeAuthenticator: verifies credentials before upgrade, registers on accept
/// 3. mapper: domain category -> wire event
/// 4. Publisher: per-user fan-out to live handles
/// 5. LifecycleManager: per-handle cleanup on close
/// 6. WsSession: actix actor tying one socket to the pieces above

pub mod handshake;
pub mod lifecycle;
pub mod mapper;
pub mod messages;
pub mod publisher;
pub mod registry;
pub mod session;

pub use handshake::{extract_credential, HandshakeAuthenticator, HandshakeError, PendingConnection};
pub use lifecycle::{ActiveConnection, CloseReason, ConnectionState, LifecycleManager};
pub use mapper::{map_to_wire_event, WireEvent};
pub use messages::WebSocketMessage;
pub use publisher::Publisher;
pub use registry::{AddOutcome, ConnectionId, ConnectionSender, SessionRegistry};
pub use session::WsSession;
