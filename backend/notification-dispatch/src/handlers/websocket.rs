/// WebSocket endpoints
///
/// `GET /ws` upgrades an authenticated client; the `/api/v1/ws` scope exposes
/// presence introspection and the internal publish hook used by the
/// service layer.
use actix_web::{http::header, web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use serde::Deserialize;
use serde_json::json;

use super::guards::InternalCaller;
use crate::error::AppError;
use crate::models::{NotificationKind, OutboundNotification, UserId};
use crate::state::AppState;
use crate::websocket::{extract_credential, WsSession};

/// Handshake query parameters
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// Open a notification socket
///
/// Endpoint: GET /ws?token=JWT (or `Authorization: Bearer JWT`)
///
/// The credential is checked before the upgrade; a bad or missing token
/// gets a plain 401 and no socket. An unparseable query string (for example
/// a repeated `token`) counts as no query credential.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let query_token = web::Query::<WsAuthQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().token);
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let credential = extract_credential(query_token.as_deref(), authorization);

    let pending = state
        .authenticator
        .authenticate(credential)
        .map_err(AppError::from)?;

    let session = WsSession::new(
        pending,
        state.authenticator.clone(),
        state.lifecycle.clone(),
        &state.config.websocket,
    );

    ws::start(session, &req, stream)
}

/// Get WebSocket connection status for a user
///
/// Endpoint: GET /api/v1/ws/status/{user_id}
pub async fn ws_status(
    path: web::Path<UserId>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();
    let connection_count = state.registry.connection_count(user_id);

    Ok(HttpResponse::Ok().json(json!({
        "user_id": user_id,
        "connected": connection_count > 0,
        "connection_count": connection_count
    })))
}

/// Get connection metrics
///
/// Endpoint: GET /api/v1/ws/metrics
pub async fn ws_metrics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let total_connections = state.registry.total_connections();
    let connected_users = state.registry.connected_users_count();

    Ok(HttpResponse::Ok().json(json!({
        "total_connections": total_connections,
        "connected_users": connected_users,
        "average_connections_per_user": if connected_users > 0 {
            total_connections as f64 / connected_users as f64
        } else {
            0.0
        }
    })))
}

/// Get list of all connected user IDs
///
/// Endpoint: GET /api/v1/ws/users
pub async fn list_connected_users(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let user_ids = state.registry.connected_user_ids();

    Ok(HttpResponse::Ok().json(json!({
        "count": user_ids.len(),
        "users": user_ids
    })))
}

#[derive(Debug, Deserialize)]
pub struct NotifyPayload {
    pub category: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub notification_id: Option<i64>,
}

/// Push a notification to a user's live sessions
///
/// Endpoint: POST /api/v1/ws/notify/{user_id}
///
/// Internal callers only (`X-Internal-Token`).
pub async fn send_user_notification(
    _caller: InternalCaller,
    path: web::Path<UserId>,
    body: web::Json<NotifyPayload>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let recipient_id = path.into_inner();
    let body = body.into_inner();

    let kind = NotificationKind::from_parts(&body.category, body.data)?;
    let mut notification = OutboundNotification::new(recipient_id, body.message, kind);
    if let Some(id) = body.notification_id {
        notification = notification.with_id(id);
    }

    let report = state.dispatcher.dispatch(&notification);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "recipient_id": report.recipient_id,
        "wire_event": report.wire_event,
        "delivered": report.delivered,
        "message": if report.delivered > 0 {
            "Notification sent to connected clients"
        } else {
            "User not connected"
        }
    })))
}

/// Register WebSocket routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_connect)).service(
        web::scope("/api/v1/ws")
            .route("/status/{user_id}", web::get().to(ws_status))
            .route("/metrics", web::get().to(ws_metrics))
            .route("/users", web::get().to(list_connected_users))
            .route("/notify/{user_id}", web::post().to(send_user_notification)),
    );
}
