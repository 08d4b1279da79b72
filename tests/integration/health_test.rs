//! Integration tests for health endpoints.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert!(response.body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_detailed_health_reports_connection_counts() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health/detailed").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["ws_connections"], 0);
    assert_eq!(response.body["data"]["online_users"], 0);

    let client = app.connect_as(&app.ada, app.general.id).await;

    let response = app.request("GET", "/api/health/detailed").await;
    assert_eq!(response.body["data"]["ws_connections"], 1);
    assert_eq!(response.body["data"]["online_users"], 1);

    client.close().await;
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
