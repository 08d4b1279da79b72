//! WebSocket upgrade handler and socket pump.
//!
//! The upgrade always completes; the session then authenticates in-band so
//! a rejected connection receives a close frame with the rejection code
//! rather than an HTTP error the browser cannot inspect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use parlor_core::error::{AppError, ErrorKind};
use parlor_core::types::ChannelId;
use parlor_realtime::connection::run_idle_monitor;
use parlor_realtime::{ChatSession, CloseReason, OutboundEvent};

use crate::error::GatewayError;
use crate::state::AppState;

/// Query parameters of the WebSocket endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Bearer connection token. Optional so its absence is rejected with a
    /// close frame instead of a 400 before the upgrade.
    pub token: Option<String>,
}

/// GET /ws/chat/{channel_id}?token={jwt} — WebSocket upgrade
pub async fn ws_chat(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, GatewayError> {
    let channel_id: ChannelId = channel_id
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid channel id: {channel_id}")))?;

    Ok(ws.on_upgrade(move |socket| run_connection(state, socket, channel_id, query.token)))
}

/// Drives one accepted socket through its whole life.
async fn run_connection(
    state: AppState,
    socket: WebSocket,
    channel_id: ChannelId,
    token: Option<String>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (session, outbound_rx) = match state
        .engine
        .open_session(token.as_deref(), channel_id)
        .await
    {
        Ok(opened) => opened,
        Err(err) => {
            let reason = match err.kind {
                ErrorKind::Authentication => CloseReason::AuthenticationFailed,
                ErrorKind::Authorization => CloseReason::AccessDenied,
                _ => CloseReason::Internal,
            };
            info!(
                channel_id = %channel_id,
                error = %err,
                "Connection rejected"
            );
            let _ = ws_tx.send(close_frame(reason)).await;
            let _ = ws_tx.close().await;
            return;
        }
    };

    let handle = session.handle.clone();
    let conn_id = handle.id;

    // Writer: drains the outbound queue until a close is initiated, then
    // writes the close frame carrying the recorded reason.
    let writer = {
        let handle = handle.clone();
        let mut outbound_rx = outbound_rx;
        let mut close_signal = handle.close_signal();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = outbound_rx.recv() => match event {
                        Some(event) => {
                            if send_event(&mut ws_tx, &event).await.is_err() {
                                handle.begin_close(CloseReason::Internal);
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = close_signal.changed() => break,
                }
            }
            let reason = handle.close_reason().unwrap_or(CloseReason::Normal);
            let _ = ws_tx.send(close_frame(reason)).await;
            let _ = ws_tx.close().await;
        })
    };

    // Liveness detection for transports that die without a close frame.
    let monitor = tokio::spawn(run_idle_monitor(
        handle.clone(),
        Duration::from_secs(state.config.realtime.idle_check_interval_seconds),
        Duration::from_secs(state.config.realtime.idle_timeout_seconds),
    ));

    let reason = read_loop(&session, &mut ws_rx).await;
    session.close(reason).await;

    monitor.abort();
    if let Err(err) = writer.await {
        debug!(conn_id = %conn_id, error = %err, "Writer task ended abnormally");
    }

    debug!(conn_id = %conn_id, "Socket pump finished");
}

/// Reads frames until the client closes, the transport fails, or a close is
/// initiated elsewhere (forced shutdown, slow consumer, idle timeout).
async fn read_loop(
    session: &Arc<ChatSession>,
    ws_rx: &mut futures::stream::SplitStream<WebSocket>,
) -> CloseReason {
    let mut close_signal = session.handle.close_signal();
    loop {
        tokio::select! {
            message = ws_rx.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    session.handle_frame(text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) => return CloseReason::Normal,
                // Ping/pong are answered by axum; binary frames are not
                // part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(conn_id = %session.handle.id, error = %err, "Socket error");
                    return CloseReason::Internal;
                }
                None => return CloseReason::Normal,
            },
            // Copy the reason out of the watch guard inside the branch future:
            // the guard itself is not `Send` and must not cross an await point.
            result = async {
                close_signal
                    .wait_for(|reason| reason.is_some())
                    .await
                    .map(|reason| *reason)
            } => {
                return match result {
                    Ok(reason) => reason.unwrap_or(CloseReason::Internal),
                    Err(_) => CloseReason::Internal,
                };
            }
        }
    }
}

async fn send_event(
    ws_tx: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &OutboundEvent,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "Outbound event serialization failed");
            return Ok(());
        }
    };
    ws_tx.send(Message::Text(text.into())).await
}

fn close_frame(reason: CloseReason) -> Message {
    Message::Close(Some(CloseFrame {
        code: reason.close_code(),
        reason: reason.as_str().into(),
    }))
}
