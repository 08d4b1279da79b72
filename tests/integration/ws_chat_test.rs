//! Integration tests for message relay and the connect snapshot.

use std::time::Duration;

use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_connect_snapshot_carries_channel_info() {
    let app = TestApp::new().await;
    let token = app.token_for(&app.ada);

    let mut client = app.connect(app.general.id, Some(&token)).await;

    let info = client.recv_type("channel.info").await;
    assert_eq!(info["channel"]["name"], "general");
    assert_eq!(
        info["channel"]["id"].as_str(),
        Some(app.general.id.to_string().as_str())
    );

    let history = client.recv_type("messages.history").await;
    assert_eq!(history["messages"].as_array().map(Vec::len), Some(0));

    let online = client.recv_type("online.users").await;
    assert_eq!(online["users"].as_array().map(Vec::len), Some(0));

    client.close().await;
}

#[tokio::test]
async fn test_message_reaches_peer_but_is_not_echoed() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    // ada sees grace come online
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "chat.message", "content": "hello grace"}))
        .await;

    let event = grace.recv_type("chat.message").await;
    assert_eq!(event["message"]["content"], "hello grace");
    assert_eq!(event["message"]["username"], "ada");
    assert_eq!(event["message"]["content_type"], "text");

    // The sender gets no copy of their own message.
    ada.expect_silence(Duration::from_millis(300)).await;

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_history_backlog_is_newest_first() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;

    ada.send(json!({"type": "chat.message", "content": "first"}))
        .await;
    ada.send(json!({"type": "chat.message", "content": "second"}))
        .await;
    // Heartbeat round-trip proves both messages are persisted.
    ada.send(json!({"type": "heartbeat"})).await;
    ada.recv_type("heartbeat.ack").await;

    let token = app.token_for(&app.grace);
    let mut grace = app.connect(app.general.id, Some(&token)).await;
    grace.recv_type("channel.info").await;
    let history = grace.recv_type("messages.history").await;
    grace.recv_type("online.users").await;

    let messages = history["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "second");
    assert_eq!(messages[1]["content"], "first");

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_empty_message_earns_error_event() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;

    ada.send(json!({"type": "chat.message", "content": "   "}))
        .await;

    let event = ada.recv_type("error").await;
    assert_eq!(event["code"], "VALIDATION");

    // The connection stays usable.
    ada.send(json!({"type": "heartbeat"})).await;
    ada.recv_type("heartbeat.ack").await;

    ada.close().await;
}

#[tokio::test]
async fn test_malformed_frame_earns_error_event() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;

    ada.send_raw("{this is not json").await;

    let event = ada.recv_type("error").await;
    assert_eq!(event["code"], "VALIDATION");

    ada.close().await;
}

#[tokio::test]
async fn test_unknown_frame_type_is_ignored() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;

    ada.send(json!({"type": "call.start", "target": "grace"}))
        .await;

    ada.expect_silence(Duration::from_millis(300)).await;

    // Still alive.
    ada.send(json!({"type": "heartbeat"})).await;
    ada.recv_type("heartbeat.ack").await;

    ada.close().await;
}

#[tokio::test]
async fn test_heartbeat_is_acknowledged() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;

    ada.send(json!({"type": "heartbeat"})).await;

    let ack = ada.recv_type("heartbeat.ack").await;
    assert!(ack["timestamp"].is_string());

    ada.close().await;
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let app = TestApp::with_realtime(|rt| {
        rt.idle_timeout_seconds = 1;
        rt.idle_check_interval_seconds = 1;
    })
    .await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;

    // Send nothing and wait for the idle monitor to fire.
    let (code, reason) = ada.recv_close().await;
    assert_eq!(code, 3000);
    assert_eq!(reason, "idle_timeout");
}
