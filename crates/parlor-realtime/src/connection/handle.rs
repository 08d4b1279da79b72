//! Individual connection handle.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use parlor_core::traits::ResolvedIdentity;
use parlor_core::types::{TenantId, UserId};

use crate::events::OutboundEvent;

/// Unique connection identifier, generated per accepted socket.
pub type ConnectionId = Uuid;

/// Normal closure (also used for server shutdown).
pub const CLOSE_NORMAL: u16 = 1000;
/// Internal error, slow consumer, or idle timeout.
pub const CLOSE_INTERNAL: u16 = 3000;
/// Authentication or authorization rejection.
pub const CLOSE_REJECTED: u16 = 4000;

/// Why a connection is being shut down.
///
/// The first reason recorded on a handle wins; later attempts are ignored so
/// every observer sees the same cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Client closed the socket or the session ended normally.
    Normal,
    /// The process is shutting down.
    ServerShutdown,
    /// Credential rejected.
    AuthenticationFailed,
    /// Authenticated but not allowed into the requested channel.
    AccessDenied,
    /// Outbound queue overflowed; the client cannot keep up.
    SlowConsumer,
    /// No inbound activity within the idle window.
    IdleTimeout,
    /// Unexpected server-side failure.
    Internal,
}

impl CloseReason {
    /// The WebSocket close code written in the close frame.
    pub fn close_code(&self) -> u16 {
        match self {
            CloseReason::Normal | CloseReason::ServerShutdown => CLOSE_NORMAL,
            CloseReason::AuthenticationFailed | CloseReason::AccessDenied => CLOSE_REJECTED,
            CloseReason::SlowConsumer | CloseReason::IdleTimeout | CloseReason::Internal => {
                CLOSE_INTERNAL
            }
        }
    }

    /// Short label used in logs and close frames.
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Normal => "normal",
            CloseReason::ServerShutdown => "server_shutdown",
            CloseReason::AuthenticationFailed => "authentication_failed",
            CloseReason::AccessDenied => "access_denied",
            CloseReason::SlowConsumer => "slow_consumer",
            CloseReason::IdleTimeout => "idle_timeout",
            CloseReason::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handle to a single live connection.
///
/// Holds the bounded sender for pushing events to the socket writer, plus
/// cached identity fields and the close signal. Group members are stored as
/// handles, so delivery never needs a lookup.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Tenant the user belongs to.
    pub tenant_id: TenantId,
    /// Login name (cached for broadcasts).
    pub username: String,
    /// Human-readable name (cached for broadcasts).
    pub display_name: String,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Bounded queue feeding the socket writer task.
    outbound: mpsc::Sender<OutboundEvent>,
    /// Close signal; `Some(reason)` once a close has been initiated.
    close: watch::Sender<Option<CloseReason>>,
    /// Last inbound activity.
    last_activity: tokio::sync::RwLock<DateTime<Utc>>,
}

impl ConnectionHandle {
    /// Creates a handle for an authenticated identity.
    pub fn new(identity: &ResolvedIdentity, outbound: mpsc::Sender<OutboundEvent>) -> Self {
        let (close, _) = watch::channel(None);
        Self {
            id: Uuid::new_v4(),
            user_id: identity.user_id,
            tenant_id: identity.tenant_id,
            username: identity.username.clone(),
            display_name: identity.display_name.clone(),
            connected_at: Utc::now(),
            outbound,
            close,
            last_activity: tokio::sync::RwLock::new(Utc::now()),
        }
    }

    /// Enqueues an event for this connection without blocking.
    ///
    /// A full queue means the client is not draining fast enough; the
    /// connection is closed as a slow consumer rather than stalling the
    /// publisher. Returns whether the event was enqueued.
    pub fn deliver(&self, event: OutboundEvent) -> bool {
        if self.is_closing() {
            return false;
        }
        match self.outbound.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    conn_id = %self.id,
                    user_id = %self.user_id,
                    "Outbound queue full, closing slow consumer"
                );
                self.begin_close(CloseReason::SlowConsumer);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.begin_close(CloseReason::Internal);
                false
            }
        }
    }

    /// Initiates a close with the given reason.
    ///
    /// Returns true if this call recorded the reason; false if a close was
    /// already underway (the earlier reason stands).
    pub fn begin_close(&self, reason: CloseReason) -> bool {
        self.close.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        })
    }

    /// Whether a close has been initiated.
    pub fn is_closing(&self) -> bool {
        self.close.borrow().is_some()
    }

    /// The recorded close reason, if any.
    pub fn close_reason(&self) -> Option<CloseReason> {
        *self.close.borrow()
    }

    /// A receiver that observes the close signal.
    pub fn close_signal(&self) -> watch::Receiver<Option<CloseReason>> {
        self.close.subscribe()
    }

    /// Waits until a close has been initiated and returns the reason.
    pub async fn closed(&self) -> CloseReason {
        let mut signal = self.close.subscribe();
        match signal.wait_for(|reason| reason.is_some()).await {
            Ok(reason) => reason.unwrap_or(CloseReason::Internal),
            Err(_) => CloseReason::Internal,
        }
    }

    /// Refreshes the last-activity timestamp.
    pub async fn touch(&self) {
        *self.last_activity.write().await = Utc::now();
    }

    /// Last inbound activity timestamp.
    pub async fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.read().await
    }
}
