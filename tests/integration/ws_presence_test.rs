//! Integration tests for presence and status updates.

use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_peer_connect_announces_online_then_join() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;

    let grace = app.connect_as(&app.grace, app.general.id).await;

    let presence = ada.recv_type("presence.update").await;
    assert_eq!(
        presence["user_id"].as_str(),
        Some(app.grace.id.to_string().as_str())
    );
    assert_eq!(presence["is_online"], true);

    let join = ada.recv_type("user.join").await;
    assert_eq!(join["username"], "grace");

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_connect_snapshot_lists_online_peers() {
    let app = TestApp::new().await;
    let ada = app.connect_as(&app.ada, app.general.id).await;

    let token = app.token_for(&app.grace);
    let mut grace = app.connect(app.general.id, Some(&token)).await;
    grace.recv_type("channel.info").await;
    grace.recv_type("messages.history").await;

    // Ada was already here; grace herself is not in the list.
    let online = grace.recv_type("online.users").await;
    let users = online["users"].as_array().expect("users array");
    assert_eq!(users.len(), 1);
    assert_eq!(
        users[0]["user_id"].as_str(),
        Some(app.ada.id.to_string().as_str())
    );
    assert_eq!(users[0]["username"], "ada");

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_connecting_client_sees_no_self_presence() {
    let app = TestApp::new().await;
    let token = app.token_for(&app.ada);

    let mut ada = app.connect(app.general.id, Some(&token)).await;

    // Exactly the connect snapshot, nothing about ada herself: the
    // online-users list is empty because she is the only one here.
    ada.recv_type("channel.info").await;
    ada.recv_type("messages.history").await;
    let online = ada.recv_type("online.users").await;
    assert_eq!(online["users"].as_array().map(Vec::len), Some(0));
    ada.expect_silence(std::time::Duration::from_millis(300))
        .await;

    ada.close().await;
}

#[tokio::test]
async fn test_peer_disconnect_announces_offline_then_leave() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    grace.close().await;

    let presence = ada.recv_type("presence.update").await;
    assert_eq!(presence["is_online"], false);
    assert!(presence["last_seen"].is_string());

    let leave = ada.recv_type("user.leave").await;
    assert_eq!(leave["username"], "grace");

    ada.close().await;
}

#[tokio::test]
async fn test_offline_only_after_last_device_disconnects() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;

    let grace_laptop = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    // A second device joins without a second online transition.
    let grace_phone = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("user.join").await;

    // First device leaving keeps grace online.
    grace_laptop.close().await;
    ada.recv_type("user.leave").await;
    assert!(app.engine.presence.is_online(app.grace.id));

    // Last device leaving takes her offline.
    grace_phone.close().await;
    let presence = ada.recv_type("presence.update").await;
    assert_eq!(presence["is_online"], false);
    ada.recv_type("user.leave").await;

    ada.close().await;
}

#[tokio::test]
async fn test_status_update_is_broadcast() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    grace
        .send(json!({
            "type": "status.update",
            "status": "in a call",
            "status_emoji": "📞",
        }))
        .await;

    let presence = ada.recv_type("presence.update").await;
    assert_eq!(
        presence["user_id"].as_str(),
        Some(app.grace.id.to_string().as_str())
    );
    assert_eq!(presence["is_online"], true);
    assert_eq!(presence["status"], "in a call");
    assert_eq!(presence["status_emoji"], "📞");

    ada.close().await;
    grace.close().await;
}

#[tokio::test]
async fn test_long_status_is_truncated() {
    let app = TestApp::new().await;
    let mut ada = app.connect_as(&app.ada, app.general.id).await;
    let mut grace = app.connect_as(&app.grace, app.general.id).await;
    ada.recv_type("presence.update").await;
    ada.recv_type("user.join").await;

    grace
        .send(json!({
            "type": "status.update",
            "status": "this status is far too long to keep",
        }))
        .await;

    let presence = ada.recv_type("presence.update").await;
    // Default cap is ten characters.
    assert_eq!(presence["status"], "this statu");

    ada.close().await;
    grace.close().await;
}
