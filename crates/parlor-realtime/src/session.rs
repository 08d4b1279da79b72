//! Connection session state machine.
//!
//! One `ChatSession` per live client connection. The session owns
//! authentication, group membership, inbound dispatch, and the once-only
//! disconnect cleanup; all cross-connection coordination goes through the
//! group registry.

use std::sync::Arc;
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::{mpsc, OnceCell};
use tracing::{debug, info, warn};

use parlor_core::error::AppError;
use parlor_core::result::AppResult;
use parlor_core::traits::ResolvedIdentity;
use parlor_core::types::ChannelId;

use crate::connection::{CloseReason, ConnectionHandle};
use crate::engine::ChatEngine;
use crate::events::{decode_frame, FrameDecode, InboundEvent, MessagePayload, OutboundEvent};
use crate::groups::{GroupEvent, GroupName};

/// Lifecycle of a session. `Closed` is terminal and reached exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    JoiningGroups,
    Active,
    Closing,
    Closed,
}

/// One live client connection on its channel.
#[derive(Debug)]
pub struct ChatSession {
    engine: Arc<ChatEngine>,
    /// The connection this session owns.
    pub handle: Arc<ConnectionHandle>,
    identity: ResolvedIdentity,
    channel_id: ChannelId,
    state: Mutex<SessionState>,
    /// Guarantees the cleanup sequence runs once; racing closers await it.
    cleanup: OnceCell<()>,
}

impl ChatSession {
    /// Runs the connect sequence for one connection attempt.
    ///
    /// Authentication and the channel access check happen before any group
    /// join or presence effect; their failures are fatal and leave no trace.
    /// Once the session is `Active`, a `user.join` broadcast goes out and
    /// the channel snapshot plus message backlog are delivered to this
    /// connection only (failures there are logged and non-fatal).
    pub(crate) async fn open(
        engine: Arc<ChatEngine>,
        credential: Option<&str>,
        channel_id: ChannelId,
    ) -> AppResult<(Arc<Self>, mpsc::Receiver<OutboundEvent>)> {
        // Authenticating
        let credential = credential
            .ok_or_else(|| AppError::authentication("Missing connection credential"))?;
        let identity = engine.identity.resolve(credential).await?;
        if !identity.is_active {
            return Err(AppError::authentication("Account is inactive"));
        }

        // Access check: the channel must exist, belong to the caller's
        // tenant, and list the caller as someone allowed to join.
        let snapshot = engine
            .store
            .channel_info(channel_id)
            .await?
            .ok_or_else(|| AppError::authorization("Channel not found"))?;
        if snapshot.tenant_id != identity.tenant_id {
            return Err(AppError::authorization("Channel not found"));
        }
        if !engine.access.may_join(identity.user_id, channel_id).await? {
            return Err(AppError::authorization(
                "Not a participant of this channel",
            ));
        }

        // JoiningGroups
        let (handle, outbound_rx) = engine.connections.register(&identity);
        let session = Arc::new(Self {
            engine: engine.clone(),
            handle: handle.clone(),
            identity: identity.clone(),
            channel_id,
            state: Mutex::new(SessionState::JoiningGroups),
            cleanup: OnceCell::new(),
        });

        let tenant_id = identity.tenant_id;
        let rollback = |opened: bool| {
            let engine = engine.clone();
            let handle = handle.clone();
            let user_id = identity.user_id;
            async move {
                // A half-joined connection must not linger.
                let _ = engine.registry.leave_all(handle.id).await;
                if opened {
                    engine.presence.connection_closed(user_id).await;
                }
                engine.connections.unregister(handle.id);
            }
        };

        for group in [
            GroupName::Chat {
                tenant_id,
                channel_id,
            },
            GroupName::Typing {
                tenant_id,
                channel_id,
            },
        ] {
            if let Err(err) = engine.registry.join(group, handle.clone()).await {
                rollback(false).await;
                return Err(err);
            }
        }

        // Mark online before joining the presence groups: peers see the
        // diff, the connection that caused it does not receive its own.
        engine.presence.connection_opened(&identity).await;

        for group in [
            GroupName::Presence { tenant_id },
            GroupName::User {
                tenant_id,
                user_id: identity.user_id,
            },
        ] {
            if let Err(err) = engine.registry.join(group, handle.clone()).await {
                rollback(true).await;
                return Err(err);
            }
        }

        session.set_state(SessionState::Active);

        info!(
            conn_id = %handle.id,
            user_id = %identity.user_id,
            channel_id = %channel_id,
            "Session active"
        );

        if let Err(err) = engine
            .registry
            .publish(
                &GroupName::Chat {
                    tenant_id,
                    channel_id,
                },
                GroupEvent::from_connection(
                    handle.id,
                    OutboundEvent::UserJoin {
                        user_id: identity.user_id,
                        username: identity.username.clone(),
                        timestamp: Utc::now(),
                    },
                ),
            )
            .await
        {
            warn!(conn_id = %handle.id, error = %err, "Join broadcast failed");
        }

        session.send_snapshot(snapshot).await;

        Ok((session, outbound_rx))
    }

    /// Delivers `channel.info`, the recent-message backlog, and the
    /// online-users snapshot to this connection. Failures are logged; the
    /// session stays active.
    async fn send_snapshot(&self, snapshot: parlor_core::types::ChannelSnapshot) {
        self.handle
            .deliver(OutboundEvent::ChannelInfo { channel: snapshot });

        match self
            .engine
            .store
            .recent_messages(self.channel_id, self.engine.config.history_limit)
            .await
        {
            Ok(records) => {
                let messages = records
                    .iter()
                    .map(|record| {
                        MessagePayload::from_stored(&record.message, record.read_by.clone())
                    })
                    .collect();
                self.handle
                    .deliver(OutboundEvent::MessagesHistory { messages });
            }
            Err(err) => {
                warn!(
                    conn_id = %self.handle.id,
                    channel_id = %self.channel_id,
                    error = %err,
                    "History backlog delivery failed"
                );
            }
        }

        let users = self
            .engine
            .presence
            .online_users(self.identity.tenant_id, self.identity.user_id);
        self.handle.deliver(OutboundEvent::OnlineUsers { users });
    }

    /// Processes one raw inbound frame.
    ///
    /// Malformed payloads earn the connection a local `error` event and
    /// nothing else; an unknown event type is logged and skipped. Every
    /// frame refreshes the activity timestamp.
    pub async fn handle_frame(&self, raw: &str) {
        if self.handle.is_closing() {
            return;
        }
        self.handle.touch().await;

        match decode_frame(raw) {
            FrameDecode::Event(event) => self.dispatch(event).await,
            FrameDecode::UnknownType(tag) => {
                debug!(conn_id = %self.handle.id, event_type = %tag, "Unknown event type ignored");
            }
            FrameDecode::Malformed(detail) => {
                self.report(AppError::validation(format!("Malformed frame: {detail}")));
            }
        }
    }

    async fn dispatch(&self, event: InboundEvent) {
        match event {
            InboundEvent::ChatMessage {
                content,
                content_type,
            } => {
                let result = self
                    .engine
                    .relay
                    .relay(
                        self.handle.id,
                        self.identity.tenant_id,
                        self.channel_id,
                        self.identity.sender_info(),
                        content,
                        content_type,
                    )
                    .await;
                if let Err(err) = result {
                    self.report(err);
                }
            }
            InboundEvent::Typing { is_typing } => {
                self.engine
                    .typing
                    .set_typing(
                        self.identity.tenant_id,
                        self.channel_id,
                        self.identity.user_id,
                        self.handle.id,
                        is_typing,
                    )
                    .await;
            }
            InboundEvent::MessageRead { message_id } => {
                let result = self
                    .engine
                    .receipts
                    .mark_read(
                        self.handle.id,
                        self.identity.tenant_id,
                        self.channel_id,
                        self.identity.user_id,
                        message_id,
                    )
                    .await;
                if let Err(err) = result {
                    self.report(err);
                }
            }
            InboundEvent::MessageReadAll => {
                let result = self
                    .engine
                    .receipts
                    .mark_all_read(self.channel_id, self.identity.user_id)
                    .await;
                match result {
                    Ok(covered) => {
                        debug!(
                            conn_id = %self.handle.id,
                            covered,
                            "Marked all read"
                        );
                    }
                    Err(err) => self.report(err),
                }
            }
            InboundEvent::StatusUpdate {
                status,
                status_emoji,
            } => {
                self.engine
                    .presence
                    .update_status(&self.identity, status, status_emoji)
                    .await;
            }
            InboundEvent::Heartbeat => {
                self.handle.deliver(OutboundEvent::HeartbeatAck {
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Reports a recoverable failure to this connection and keeps it open.
    fn report(&self, err: AppError) {
        debug!(conn_id = %self.handle.id, error = %err, "Reporting error to connection");
        self.handle.deliver(OutboundEvent::from_error(&err));
    }

    /// Closes the session.
    ///
    /// Idempotent and safe to race from the receive path and an external
    /// shutdown: the first caller records the reason and runs the cleanup
    /// sequence; every caller returns only after cleanup has completed.
    pub async fn close(&self, reason: CloseReason) {
        self.handle.begin_close(reason);
        self.cleanup.get_or_init(|| self.run_cleanup()).await;
    }

    async fn run_cleanup(&self) {
        self.set_state(SessionState::Closing);
        let conn_id = self.handle.id;
        let user_id = self.identity.user_id;

        if let Err(err) = self.engine.registry.leave_all(conn_id).await {
            warn!(conn_id = %conn_id, error = %err, "Group cleanup failed");
        }

        self.engine
            .typing
            .clear(self.channel_id, user_id)
            .await;

        self.engine.presence.connection_closed(user_id).await;

        let leave = OutboundEvent::UserLeave {
            user_id,
            username: self.identity.username.clone(),
            timestamp: Utc::now(),
        };
        if let Err(err) = self
            .engine
            .registry
            .publish(
                &GroupName::Chat {
                    tenant_id: self.identity.tenant_id,
                    channel_id: self.channel_id,
                },
                GroupEvent::from_connection(conn_id, leave),
            )
            .await
        {
            warn!(conn_id = %conn_id, error = %err, "Leave broadcast failed");
        }

        self.engine.connections.unregister(conn_id);
        self.set_state(SessionState::Closed);

        info!(
            conn_id = %conn_id,
            user_id = %user_id,
            reason = %self.handle.close_reason().unwrap_or(CloseReason::Internal),
            "Session closed"
        );
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Channel this session is joined to.
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// The authenticated identity behind this session.
    pub fn identity(&self) -> &ResolvedIdentity {
        &self.identity
    }

    fn set_state(&self, state: SessionState) {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}
