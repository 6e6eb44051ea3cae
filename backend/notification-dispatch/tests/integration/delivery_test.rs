use awc::Client;
use futures_util::SinkExt;
use notification_dispatch::models::{
    NewCommentData, NotificationKind, OutboundNotification, PriceChangeData,
};
use notification_dispatch::{WebSocketMessage, WireEvent};
use serde_json::json;

use notification_dispatch::handlers::INTERNAL_TOKEN_HEADER;

use super::support::{assert_no_message, next_message, start_server, INTERNAL_TOKEN};

fn price_change(recipient_id: i64, product_id: i64) -> OutboundNotification {
    OutboundNotification::new(
        recipient_id,
        "price changed!",
        NotificationKind::PriceChange(PriceChangeData {
            product_id,
            old_price: None,
            new_price: None,
        }),
    )
}

#[actix_rt::test]
async fn price_change_reaches_connected_user_only() {
    let server = start_server(None).await.expect("start server");
    let token = server.token_for(7);

    let (_resp, mut connection) = Client::new()
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect websocket client");
    assert!(matches!(
        next_message(&mut connection).await,
        WebSocketMessage::Connected { user_id: 7, .. }
    ));

    let report = server.state.dispatcher.dispatch(&price_change(7, 101));
    assert_eq!(report.wire_event, WireEvent::System);
    assert_eq!(report.delivered, 1);

    assert_eq!(
        next_message(&mut connection).await,
        WebSocketMessage::Event {
            event: WireEvent::System,
            payload: json!({ "message": "price changed!", "data": { "productId": 101 } }),
        }
    );

    // User 9 never connected
    let offline = server.state.dispatcher.dispatch(&price_change(9, 101));
    assert_eq!(offline.delivered, 0);
    assert!(server.state.registry.handles_for(9).is_empty());
    assert_no_message(&mut connection).await;

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn every_tab_receives_each_notification_once() {
    let server = start_server(None).await.expect("start server");
    let token = server.token_for(7);
    let client = Client::new();

    let (_r1, mut tab1) = client
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect first tab");
    let (_r2, mut tab2) = client
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect second tab");
    next_message(&mut tab1).await;
    next_message(&mut tab2).await;
    assert_eq!(server.state.registry.connection_count(7), 2);

    let comment = OutboundNotification::new(
        7,
        "new comment",
        NotificationKind::NewComment(NewCommentData {
            article_id: 3,
            comment_id: 44,
            author_id: Some(9),
        }),
    );
    let report = server.state.dispatcher.dispatch(&comment);
    assert_eq!(report.delivered, 2);

    for tab in [&mut tab1, &mut tab2] {
        match next_message(tab).await {
            WebSocketMessage::Event { event, payload } => {
                assert_eq!(event, WireEvent::Chat);
                assert_eq!(payload["data"]["commentId"], json!(44));
            }
            other => panic!("expected event frame, got {other:?}"),
        }
        assert_no_message(tab).await;
    }

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn notify_endpoint_publishes_to_live_session() {
    let server = start_server(None).await.expect("start server");
    let token = server.token_for(7);
    let client = Client::new();

    let (_resp, mut connection) = client
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect websocket client");
    next_message(&mut connection).await;

    let mut resp = client
        .post(server.http_url("/api/v1/ws/notify/7"))
        .insert_header((INTERNAL_TOKEN_HEADER, INTERNAL_TOKEN))
        .send_json(&json!({
            "category": "SOMETHING_NEW",
            "message": "hello",
            "data": { "k": "v" },
            "notification_id": 12
        }))
        .await
        .expect("notify request");
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["wire_event"], json!("notification"));
    assert_eq!(body["delivered"], json!(1));

    assert_eq!(
        next_message(&mut connection).await,
        WebSocketMessage::Event {
            event: WireEvent::Notification,
            payload: json!({ "id": 12, "message": "hello", "data": { "k": "v" } }),
        }
    );

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn notify_endpoint_refuses_unauthenticated_caller() {
    let server = start_server(None).await.expect("start server");
    let token = server.token_for(7);
    let client = Client::new();

    let (_resp, mut connection) = client
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect websocket client");
    next_message(&mut connection).await;

    let resp = client
        .post(server.http_url("/api/v1/ws/notify/7"))
        .send_json(&json!({
            "category": "PRICE_CHANGE",
            "message": "forged",
            "data": { "productId": 1 }
        }))
        .await
        .expect("notify request");
    assert_eq!(resp.status().as_u16(), 401);
    assert_no_message(&mut connection).await;

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn client_ping_gets_pong() {
    let server = start_server(None).await.expect("start server");
    let token = server.token_for(7);

    let (_resp, mut connection) = Client::new()
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect websocket client");
    next_message(&mut connection).await;

    connection
        .send(awc::ws::Message::Text(
            r#"{"type":"ping","timestamp":42}"#.into(),
        ))
        .await
        .expect("send ping");

    assert_eq!(
        next_message(&mut connection).await,
        WebSocketMessage::Pong { timestamp: 42 }
    );

    server.handle.stop(true).await;
}
