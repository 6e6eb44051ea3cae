/// Per-socket actor binding the transport to the registry lifecycle
use super::{
    ActiveConnection, CloseReason, HandshakeAuthenticator, LifecycleManager, PendingConnection,
    WebSocketMessage,
};
use crate::config::WebSocketConfig;
use actix::{Actor, ActorContext, AsyncContext, Handler, StreamHandler};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub struct WsSession {
    pending: PendingConnection,
    connection: Option<ActiveConnection>,
    authenticator: HandshakeAuthenticator,
    lifecycle: LifecycleManager,
    heartbeat_interval: Duration,
    client_timeout: Duration,
    hb: Instant,
    close_reason: CloseReason,
}

impl WsSession {
    pub fn new(
        pending: PendingConnection,
        authenticator: HandshakeAuthenticator,
        lifecycle: LifecycleManager,
        config: &WebSocketConfig,
    ) -> Self {
        Self {
            pending,
            connection: None,
            authenticator,
            lifecycle,
            heartbeat_interval: config.heartbeat_interval(),
            client_timeout: config.client_timeout(),
            hb: Instant::now(),
            close_reason: CloseReason::ServerClosed,
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let client_timeout = self.client_timeout;
        ctx.run_interval(self.heartbeat_interval, move |act, ctx| {
            if Instant::now().duration_since(act.hb) > client_timeout {
                tracing::warn!(
                    user_id = act.pending.user_id,
                    connection_id = %act.pending.id,
                    "websocket heartbeat failed, disconnecting"
                );
                act.close_reason = CloseReason::HeartbeatTimeout;
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send_frame(ctx: &mut ws::WebsocketContext<Self>, message: &WebSocketMessage) {
        match message.to_json() {
            Ok(json) => ctx.text(json),
            Err(e) => tracing::warn!(error = %e, "failed to serialize websocket frame"),
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, rx) = mpsc::unbounded_channel();

        match self.authenticator.accept(self.pending, tx) {
            Ok(connection) => {
                ctx.add_message_stream(UnboundedReceiverStream::new(rx));
                Self::send_frame(
                    ctx,
                    &WebSocketMessage::connected(connection.id(), connection.user_id()),
                );
                self.connection = Some(connection);
                self.hb(ctx);
            }
            Err(err) => {
                Self::send_frame(ctx, &WebSocketMessage::error("CONNECTION_REJECTED", err.to_string()));
                ctx.close(Some(ws::CloseReason {
                    code: ws::CloseCode::Policy,
                    description: Some(err.to_string()),
                }));
                ctx.stop();
            }
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(connection) = self.connection.as_mut() {
            self.lifecycle.close(connection, self.close_reason);
        }
    }
}

/// Outbound frames queued by the publisher
impl Handler<WebSocketMessage> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: WebSocketMessage, ctx: &mut Self::Context) {
        Self::send_frame(ctx, &msg);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                match WebSocketMessage::from_json(&text) {
                    Ok(WebSocketMessage::Ping { timestamp }) => {
                        Self::send_frame(ctx, &WebSocketMessage::pong(timestamp));
                    }
                    Ok(other) => {
                        tracing::debug!(message = ?other, "ignoring client frame");
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "failed to parse client frame");
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::debug!("binary websocket frames are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(?reason, "websocket close frame received");
                self.close_reason = CloseReason::ClientClosed;
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                tracing::warn!(error = %e, "websocket protocol error");
                self.close_reason = CloseReason::TransportError;
                ctx.stop();
            }
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // Stream ended without a close frame
        if self.close_reason == CloseReason::ServerClosed {
            self.close_reason = CloseReason::TransportError;
        }
        ctx.stop();
    }
}
