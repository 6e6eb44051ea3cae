use actix_web::{middleware, web, App, HttpServer};
use notification_dispatch::{
    auth::JwtVerifier, handlers::register_websocket, logging, metrics, AppState, Config,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    tracing::info!("Starting notification dispatch service");

    let config = Config::from_env()?;
    let verifier = Arc::new(JwtVerifier::from_config(&config.auth)?);
    let addr = config.bind_address();

    tracing::info!(
        env = %config.app.env,
        heartbeat_secs = config.websocket.heartbeat_interval_secs,
        client_timeout_secs = config.websocket.client_timeout_secs,
        max_connections_per_user = ?config.websocket.max_connections_per_user,
        "configuration loaded"
    );

    if config.auth.internal_api_token.is_none() {
        tracing::warn!("INTERNAL_API_TOKEN not set, internal publish endpoint disabled");
    }

    let state = AppState::new(config, verifier);
    tracing::info!("Session registry initialized");

    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route(
                "/",
                web::get().to(|| async { "Notification Dispatch Service v1.0" }),
            )
            .configure(register_websocket)
    })
    .bind(&addr)?
    .run()
    .await?;

    tracing::info!("Notification dispatch service stopped");
    Ok(())
}
