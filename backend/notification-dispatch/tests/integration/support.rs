use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{dev::ServerHandle, web, App, HttpServer};
use awc::error::WsProtocolError;
use awc::ws;
use futures_util::{Stream, StreamExt};
use notification_dispatch::auth::JwtVerifier;
use notification_dispatch::handlers::register_websocket;
use notification_dispatch::{AppState, Config, WebSocketMessage};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const INTERNAL_TOKEN: &str = "integration-internal-token";

/// Per-test server settings
pub struct ServerOptions {
    pub max_connections_per_user: Option<usize>,
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            max_connections_per_user: None,
            heartbeat_interval_secs: 30,
            client_timeout_secs: 60,
        }
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
    pub state: AppState,
    pub verifier: Arc<JwtVerifier>,
}

impl TestServer {
    pub fn token_for(&self, user_id: i64) -> String {
        self.verifier
            .issue(user_id, chrono::Duration::hours(1))
            .expect("issue token")
    }

    pub fn ws_url(&self, token: &str) -> String {
        format!("http://{}/ws?token={}", self.addr, token)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_server(max_connections_per_user: Option<usize>) -> std::io::Result<TestServer> {
    start_server_with(ServerOptions {
        max_connections_per_user,
        ..ServerOptions::default()
    })
    .await
}

pub async fn start_server_with(options: ServerOptions) -> std::io::Result<TestServer> {
    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "INTERNAL_API_TOKEN" => Some(INTERNAL_TOKEN.to_string()),
        "WS_HEARTBEAT_INTERVAL_SECS" => Some(options.heartbeat_interval_secs.to_string()),
        "WS_CLIENT_TIMEOUT_SECS" => Some(options.client_timeout_secs.to_string()),
        "WS_MAX_CONNECTIONS_PER_USER" => options.max_connections_per_user.map(|n| n.to_string()),
        _ => None,
    })
    .expect("test config");

    let verifier = Arc::new(JwtVerifier::from_config(&config.auth).expect("verifier"));
    let state = AppState::new(config, verifier.clone());
    let app_state = state.clone();

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(register_websocket)
    })
    .workers(1)
    .listen(listener)?
    .run();

    let handle = server.handle();
    actix_rt::spawn(server);

    Ok(TestServer {
        addr,
        handle,
        state,
        verifier,
    })
}

/// Next JSON frame from the server, skipping control frames
pub async fn next_message<S>(connection: &mut S) -> WebSocketMessage
where
    S: Stream<Item = Result<ws::Frame, WsProtocolError>> + Unpin,
{
    loop {
        let frame = actix_rt::time::timeout(Duration::from_secs(5), connection.next())
            .await
            .expect("timed out waiting for frame")
            .expect("connection closed")
            .expect("frame data");

        match frame {
            ws::Frame::Text(bytes) => {
                let text = std::str::from_utf8(&bytes).expect("utf-8 frame");
                return WebSocketMessage::from_json(text).expect("valid frame");
            }
            ws::Frame::Ping(_) | ws::Frame::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Assert nothing but control frames arrives for a short while
pub async fn assert_no_message<S>(connection: &mut S)
where
    S: Stream<Item = Result<ws::Frame, WsProtocolError>> + Unpin,
{
    let waited = actix_rt::time::timeout(Duration::from_millis(200), async {
        loop {
            match connection.next().await {
                Some(Ok(ws::Frame::Ping(_))) | Some(Ok(ws::Frame::Pong(_))) => continue,
                other => return other,
            }
        }
    })
    .await;

    if let Ok(frame) = waited {
        panic!("unexpected frame: {frame:?}");
    }
}

/// Poll `condition` until it holds or a couple of seconds pass
pub async fn wait_until<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    wait_for(Duration::from_secs(2), condition).await
}

/// Poll `condition` every 20ms until it holds or `budget` runs out
pub async fn wait_for<F>(budget: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = std::time::Instant::now() + budget;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        actix_rt::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
