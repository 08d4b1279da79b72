//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use parlor_auth::JwtEncoder;
use parlor_core::config::AppConfig;
use parlor_core::config::realtime::RealtimeConfig;
use parlor_core::types::{ChannelId, ChannelKind};
use parlor_gateway::AppState;
use parlor_realtime::ChatEngine;
use parlor_store::{
    ChannelRecord, Directory, DirectoryAccessChecker, DirectoryIdentityResolver,
    InMemoryMessageStore, UserRecord,
};

/// How long to wait for an expected event before failing the test.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test application context: a seeded directory, a real listening server,
/// and token-minting helpers.
pub struct TestApp {
    /// The Axum router for direct HTTP requests.
    pub router: Router,
    /// Address the test server is listening on.
    pub addr: SocketAddr,
    /// The chat engine behind the server.
    pub engine: Arc<ChatEngine>,
    /// The backing directory, for mid-test mutations.
    pub directory: Arc<Directory>,
    /// Token encoder signing with the test secret.
    pub encoder: JwtEncoder,
    /// "ada" in tenant acme, participant of `general`.
    pub ada: UserRecord,
    /// "grace" in tenant acme, participant of `general`.
    pub grace: UserRecord,
    /// "linus" in tenant globex, not a participant of `general`.
    pub linus: UserRecord,
    /// Channel in tenant acme with ada and grace.
    pub general: ChannelRecord,
}

impl TestApp {
    /// Creates a test application with default timings.
    pub async fn new() -> Self {
        Self::with_realtime(|_| {}).await
    }

    /// Creates a test application, letting the test tune real-time timings
    /// (typing expiry, idle timeout) before the engine is built.
    pub async fn with_realtime(tune: impl FnOnce(&mut RealtimeConfig)) -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.realtime.typing_expiry_seconds = 1;
        tune(&mut config.realtime);

        let directory = Arc::new(Directory::new());
        let acme = directory.add_tenant("acme");
        let globex = directory.add_tenant("globex");
        let ada = directory
            .add_user(acme.id, "ada", "Ada Lovelace")
            .expect("seed ada");
        let grace = directory
            .add_user(acme.id, "grace", "Grace Hopper")
            .expect("seed grace");
        let linus = directory
            .add_user(globex.id, "linus", "Linus Torvalds")
            .expect("seed linus");
        let general = directory
            .create_channel(acme.id, "general", ChannelKind::Group, vec![ada.id, grace.id])
            .expect("seed general");

        let encoder = JwtEncoder::new(&config.auth);
        let decoder = parlor_auth::JwtDecoder::new(&config.auth);

        let identity = Arc::new(DirectoryIdentityResolver::new(decoder, directory.clone()));
        let access = Arc::new(DirectoryAccessChecker::new(directory.clone()));
        let store = Arc::new(InMemoryMessageStore::new(directory.clone()));

        let engine = ChatEngine::new(config.realtime.clone(), identity, access, store);

        let state = AppState::new(Arc::new(config), engine.clone());
        let router = parlor_gateway::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");

        let serve_router = router.clone();
        tokio::spawn(async move {
            axum::serve(listener, serve_router).await.expect("serve");
        });

        Self {
            router,
            addr,
            engine,
            directory,
            encoder,
            ada,
            grace,
            linus,
            general,
        }
    }

    /// Mints a valid connection token for a seeded user.
    pub fn token_for(&self, user: &UserRecord) -> String {
        self.encoder
            .generate_token(user.id, user.tenant_id, &user.username, &user.display_name)
            .expect("mint token")
    }

    /// Mints a token that expired an hour ago.
    pub fn expired_token_for(&self, user: &UserRecord) -> String {
        self.encoder
            .generate_expired_token(user.id, user.tenant_id, &user.username)
            .expect("mint expired token")
    }

    /// Builds the WebSocket URL for a channel.
    pub fn ws_url(&self, channel_id: ChannelId, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/ws/chat/{channel_id}?token={token}", self.addr),
            None => format!("ws://{}/ws/chat/{channel_id}", self.addr),
        }
    }

    /// Opens a raw WebSocket connection. The handshake always succeeds for
    /// a well-formed channel id; rejections arrive in-band as close frames.
    pub async fn connect(&self, channel_id: ChannelId, token: Option<&str>) -> WsClient {
        let url = self.ws_url(channel_id, token);
        let (stream, _response) = connect_async(&url).await.expect("websocket handshake");
        WsClient { stream }
    }

    /// Opens a connection as a seeded user and drains the connect snapshot
    /// (`channel.info`, `messages.history`, `online.users`).
    pub async fn connect_as(&self, user: &UserRecord, channel_id: ChannelId) -> WsClient {
        let token = self.token_for(user);
        let mut client = self.connect(channel_id, Some(&token)).await;
        client.recv_type("channel.info").await;
        client.recv_type("messages.history").await;
        client.recv_type("online.users").await;
        client
    }

    /// Makes an HTTP request against the router.
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test HTTP request.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Parsed JSON body.
    pub body: Value,
}

/// A connected WebSocket test client.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Sends a JSON frame.
    pub async fn send(&mut self, frame: Value) {
        self.send_raw(&frame.to_string()).await;
    }

    /// Sends a raw text frame.
    pub async fn send_raw(&mut self, raw: &str) {
        self.stream
            .send(Message::text(raw.to_string()))
            .await
            .expect("send frame");
    }

    /// Receives the next text frame as JSON. Panics on close or timeout.
    pub async fn recv(&mut self) -> Value {
        match self.next_message().await {
            Message::Text(text) => serde_json::from_str(text.as_str()).expect("parse event"),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    /// Receives the next event and asserts its `type` tag.
    pub async fn recv_type(&mut self, expected: &str) -> Value {
        let event = self.recv().await;
        assert_eq!(
            event["type"].as_str(),
            Some(expected),
            "unexpected event: {event}"
        );
        event
    }

    /// Waits for the server to close the connection and returns the close
    /// code and reason.
    pub async fn recv_close(&mut self) -> (u16, String) {
        match self.next_message().await {
            Message::Close(Some(frame)) => (u16::from(frame.code), frame.reason.as_str().to_string()),
            Message::Close(None) => panic!("close frame without code"),
            other => panic!("expected close frame, got {other:?}"),
        }
    }

    /// Asserts that no text frame arrives within the given window.
    pub async fn expect_silence(&mut self, window: Duration) {
        let result = tokio::time::timeout(window, self.stream.next()).await;
        match result {
            Err(_) => {}
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
            Ok(other) => panic!("expected silence, got {other:?}"),
        }
    }

    /// Sends a client-initiated close and drains the stream.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
        while let Some(Ok(_)) = self.stream.next().await {}
    }

    async fn next_message(&mut self) -> Message {
        loop {
            let message = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for frame")
                .expect("connection ended unexpectedly")
                .expect("websocket error");
            match message {
                Message::Ping(_) | Message::Pong(_) => continue,
                other => return other,
            }
        }
    }
}
