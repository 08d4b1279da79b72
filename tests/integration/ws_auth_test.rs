//! Integration tests for connection authentication and authorization.
//!
//! Rejections happen after the WebSocket handshake: the server completes
//! the upgrade, sends a close frame with code 4000, and hangs up.

use http::StatusCode;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

use parlor_core::types::ChannelId;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = TestApp::new().await;

    let mut client = app.connect(app.general.id, None).await;

    let (code, reason) = client.recv_close().await;
    assert_eq!(code, 4000);
    assert_eq!(reason, "authentication_failed");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::new().await;

    let mut client = app.connect(app.general.id, Some("not-a-jwt")).await;

    let (code, _) = client.recv_close().await;
    assert_eq!(code, 4000);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new().await;
    let token = app.expired_token_for(&app.ada);

    let mut client = app.connect(app.general.id, Some(&token)).await;

    let (code, reason) = client.recv_close().await;
    assert_eq!(code, 4000);
    assert_eq!(reason, "authentication_failed");
}

#[tokio::test]
async fn test_inactive_user_is_rejected() {
    let app = TestApp::new().await;
    app.directory
        .set_active(app.ada.id, false)
        .expect("deactivate");
    let token = app.token_for(&app.ada);

    let mut client = app.connect(app.general.id, Some(&token)).await;

    let (code, reason) = client.recv_close().await;
    assert_eq!(code, 4000);
    assert_eq!(reason, "authentication_failed");
}

#[tokio::test]
async fn test_cross_tenant_channel_is_rejected() {
    let app = TestApp::new().await;
    let token = app.token_for(&app.linus);

    let mut client = app.connect(app.general.id, Some(&token)).await;

    let (code, reason) = client.recv_close().await;
    assert_eq!(code, 4000);
    assert_eq!(reason, "access_denied");
}

#[tokio::test]
async fn test_non_participant_is_rejected() {
    let app = TestApp::new().await;
    let outsider = app
        .directory
        .add_user(app.ada.tenant_id, "mallory", "Mallory")
        .expect("seed outsider");
    let token = app.token_for(&outsider);

    let mut client = app.connect(app.general.id, Some(&token)).await;

    let (code, reason) = client.recv_close().await;
    assert_eq!(code, 4000);
    assert_eq!(reason, "access_denied");
}

#[tokio::test]
async fn test_unknown_channel_is_rejected() {
    let app = TestApp::new().await;
    let token = app.token_for(&app.ada);

    let mut client = app.connect(ChannelId::new(), Some(&token)).await;

    let (code, _) = client.recv_close().await;
    assert_eq!(code, 4000);
}

#[tokio::test]
async fn test_malformed_channel_id_fails_the_handshake() {
    let app = TestApp::new().await;
    let token = app.token_for(&app.ada);
    let url = format!("ws://{}/ws/chat/not-a-uuid?token={token}", app.addr);

    let err = connect_async(&url).await.err().expect("handshake rejected");
    match err {
        WsError::Http(response) => {
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        other => panic!("expected HTTP rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_valid_token_connects() {
    let app = TestApp::new().await;

    let client = app.connect_as(&app.ada, app.general.id).await;

    assert_eq!(app.engine.open_connections(), 1);
    client.close().await;
}
