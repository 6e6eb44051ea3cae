use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::services::NotificationDispatcher;
use crate::websocket::{HandshakeAuthenticator, LifecycleManager, Publisher, SessionRegistry};
use std::sync::Arc;

/// Shared application state, built once at startup and cloned into every
/// worker
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: SessionRegistry,
    pub authenticator: HandshakeAuthenticator,
    pub lifecycle: LifecycleManager,
    pub dispatcher: NotificationDispatcher,
}

impl AppState {
    pub fn new(config: Config, verifier: Arc<dyn TokenVerifier>) -> Self {
        let registry = SessionRegistry::create();
        let authenticator = HandshakeAuthenticator::new(verifier, registry.clone())
            .with_connection_limit(config.websocket.max_connections_per_user);
        let lifecycle = LifecycleManager::new(registry.clone());
        let dispatcher = NotificationDispatcher::new(Publisher::new(registry.clone()));

        Self {
            config: Arc::new(config),
            registry,
            authenticator,
            lifecycle,
            dispatcher,
        }
    }
}
