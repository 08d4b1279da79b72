//! Integration tests for read receipts.

use std::time::Duration;

use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_first_read_is_broadcast() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "chat.message", "content": "read me"}))
        .await;
    let message = grace.recv_type("chat.message").await;
    let message_id = message["message"]["id"].as_str().expect("message id");

    grace
        .send(json!({"type": "message.read", "message_id": message_id}))
        .await;

    let receipt = ada.recv_type("message.read").await;
    assert_eq!(receipt["message_id"].as_str(), Some(message_id));
    assert_eq!(
        receipt["user_id"].as_str(),
        Some(app.grace.id.to_string().as_str())
    );

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_duplicate_read_is_not_rebroadcast() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "chat.message", "content": "once"}))
        .await;
    let message = grace.recv_type("chat.message").await;
    let message_id = message["message"]["id"].as_str().expect("message id");

    grace
        .send(json!({"type": "message.read", "message_id": message_id}))
        .await;
    ada.recv_type("message.read").await;

    grace
        .send(json!({"type": "message.read", "message_id": message_id}))
        .await;
    ada.expect_silence(Duration::from_millis(300)).await;

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_unknown_message_read_is_silent() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    grace
        .send(json!({
            "type": "message.read",
            "message_id": uuid::Uuid::new_v4().to_string(),
        }))
        .await;

    ada.expect_silence(Duration::from_millis(300)).await;
    grace.expect_silence(Duration::from_millis(100)).await;

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_read_all_marks_without_broadcast() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "chat.message", "content": "backlog"}))
        .await;
    let message = grace.recv_type("chat.message").await;
    let message_id = message["message"]["id"].as_str().expect("message id");

    // Bulk mark emits nothing.
    grace.send(json!({"type": "message.read_all"})).await;
    ada.expect_silence(Duration::from_millis(300)).await;

    // The bulk mark covered the message, so an explicit read is a no-op.
    grace
        .send(json!({"type": "message.read", "message_id": message_id}))
        .await;
    ada.expect_silence(Duration::from_millis(300)).await;

    // A later message still produces a receipt, proving the path is alive.
    ada.send(json!({"type": "chat.message", "content": "after"}))
        .await;
    let message = grace.recv_type("chat.message").await;
    let later_id = message["message"]["id"].as_str().expect("message id");
    grace
        .send(json!({"type": "message.read", "message_id": later_id}))
        .await;
    let receipt = ada.recv_type("message.read").await;
    assert_eq!(receipt["message_id"].as_str(), Some(later_id));

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_own_messages_are_never_unread() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "chat.message", "content": "mine"}))
        .await;
    let message = grace.recv_type("chat.message").await;
    let message_id = message["message"]["id"].as_str().expect("message id");

    // The sender reading their own message yields no receipt.
    ada.send(json!({"type": "message.read", "message_id": message_id}))
        .await;
    grace.expect_silence(Duration::from_millis(300)).await;

    ada.close().await;
    grace.close().await;
}
