//! Integration tests for typing indicators.
//!
//! The test engine runs with a one second typing expiry.

use std::time::Duration;

use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_typing_reaches_peer_but_not_the_typist() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "typing", "is_typing": true})).await;

    let event = grace.recv_type("typing").await;
    assert_eq!(event["is_typing"], true);
    assert_eq!(
        event["user_id"].as_str(),
        Some(app.ada.id.to_string().as_str())
    );

    ada.expect_silence(Duration::from_millis(300)).await;

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_typing_stop_is_broadcast() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "typing", "is_typing": true})).await;
    grace.recv_type("typing").await;

    ada.send(json!({"type": "typing", "is_typing": false}))
        .await;
    let event = grace.recv_type("typing").await;
    assert_eq!(event["is_typing"], false);

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_typing_expires_on_its_own() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "typing", "is_typing": true})).await;
    grace.recv_type("typing").await;

    // No further frames from ada; the expiry timer clears the indicator.
    let event = grace.recv_type("typing").await;
    assert_eq!(event["is_typing"], false);
    assert_eq!(
        event["user_id"].as_str(),
        Some(app.ada.id.to_string().as_str())
    );

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_typing_refresh_does_not_rebroadcast() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "typing", "is_typing": true})).await;
    grace.recv_type("typing").await;

    // A refresh extends the timer without a duplicate broadcast.
    ada.send(json!({"type": "typing", "is_typing": true})).await;
    grace.expect_silence(Duration::from_millis(300)).await;

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_disconnect_clears_typing_indicator() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    ada.send(json!({"type": "typing", "is_typing": true})).await;
    grace.recv_type("typing").await;

    ada.close().await;

    // Disconnect cleanup stops the indicator before announcing the leave.
    let event = grace.recv_type("typing").await;
    assert_eq!(event["is_typing"], false);
    grace.recv_type("presence.update").await;
    grace.recv_type("user.leave").await;

    grace.close().await;
}
