use awc::{ws, Client};
use futures_util::SinkExt;
use notification_dispatch::WebSocketMessage;

use super::support::{next_message, start_server, wait_until};

async fn connection_id_of<S>(connection: &mut S) -> notification_dispatch::websocket::ConnectionId
where
    S: futures_util::Stream<Item = Result<ws::Frame, awc::error::WsProtocolError>> + Unpin,
{
    match next_message(connection).await {
        WebSocketMessage::Connected { connection_id, .. } => connection_id,
        other => panic!("expected connected frame, got {other:?}"),
    }
}

#[actix_rt::test]
async fn closing_one_tab_keeps_the_other() {
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
    let first = connection_id_of(&mut tab1).await;
    let second = connection_id_of(&mut tab2).await;

    tab1.send(ws::Message::Close(None)).await.expect("close first tab");

    let registry = server.state.registry.clone();
    assert!(wait_until(|| registry.connection_count(7) == 1).await);
    let remaining = registry.handles_for(7);
    assert!(remaining.contains(&second));
    assert!(!remaining.contains(&first));

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn closing_last_tab_removes_user() {
    let server = start_server(None).await.expect("start server");
    let token = server.token_for(7);

    let (_resp, mut connection) = Client::new()
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect websocket client");
    connection_id_of(&mut connection).await;
    assert!(server.state.registry.contains_user(7));

    connection
        .send(ws::Message::Close(None))
        .await
        .expect("send close");

    let registry = server.state.registry.clone();
    assert!(wait_until(|| !registry.contains_user(7)).await);
    assert_eq!(registry.connected_users_count(), 0);

    // Nothing left to deliver to
    let report = server.state.dispatcher.dispatch(
        &notification_dispatch::models::OutboundNotification::new(
            7,
            "late",
            notification_dispatch::models::NotificationKind::Unknown {
                category: "LATE".to_string(),
                data: serde_json::Value::Null,
            },
        ),
    );
    assert_eq!(report.delivered, 0);

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn dropped_transport_is_cleaned_up() {
    let server = start_server(None).await.expect("start server");
    let token = server.token_for(7);

    let (_resp, mut connection) = Client::new()
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect websocket client");
    connection_id_of(&mut connection).await;

    drop(connection);

    let registry = server.state.registry.clone();
    assert!(wait_until(|| !registry.contains_user(7)).await);

    server.handle.stop(true).await;
}

#[actix_rt::test]
async fn reconnect_gets_fresh_handle() {
    let server = start_server(None).await.expect("start server");
    let token = server.token_for(7);
    let client = Client::new();

    let (_r1, mut connection) = client
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("connect websocket client");
    let before = connection_id_of(&mut connection).await;
    connection
        .send(ws::Message::Close(None))
        .await
        .expect("send close");

    let registry = server.state.registry.clone();
    assert!(wait_until(|| !registry.contains_user(7)).await);

    let (_r2, mut reconnected) = client
        .ws(server.ws_url(&token))
        .connect()
        .await
        .expect("reconnect websocket client");
    let after = connection_id_of(&mut reconnected).await;

    assert_ne!(before, after);
    assert_eq!(registry.handles_for(7).len(), 1);
    assert!(registry.handles_for(7).contains(&after));

    server.handle.stop(true).await;
}
