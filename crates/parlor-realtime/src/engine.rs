//! Top-level chat engine that wires the real-time subsystems together.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::info;

use parlor_core::config::realtime::RealtimeConfig;
use parlor_core::result::AppResult;
use parlor_core::traits::{AccessChecker, IdentityResolver, MessageStore};
use parlor_core::types::ChannelId;

use crate::connection::{CloseReason, ConnectionManager};
use crate::events::OutboundEvent;
use crate::groups::{GroupRegistry, MemoryGroupRegistry};
use crate::presence::PresenceTracker;
use crate::receipts::ReadReceiptTracker;
use crate::relay::MessageRelay;
use crate::session::ChatSession;
use crate::typing::TypingCoordinator;

/// Central coordinator for all real-time chat subsystems.
///
/// Owns the group registry, the per-component trackers, and the connection
/// manager; sessions are opened through it and every subsystem shares its
/// collaborators.
pub struct ChatEngine {
    /// Gateway tuning knobs.
    pub config: RealtimeConfig,
    /// Registry of live connections.
    pub connections: Arc<ConnectionManager>,
    /// Broadcast group membership and fan-out.
    pub registry: Arc<dyn GroupRegistry>,
    /// Online/offline and status state.
    pub presence: Arc<PresenceTracker>,
    /// Ephemeral typing flags.
    pub typing: Arc<TypingCoordinator>,
    /// Persist-then-broadcast message path.
    pub relay: Arc<MessageRelay>,
    /// Read pointers and receipts.
    pub receipts: Arc<ReadReceiptTracker>,
    pub(crate) store: Arc<dyn MessageStore>,
    pub(crate) access: Arc<dyn AccessChecker>,
    pub(crate) identity: Arc<dyn IdentityResolver>,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("connections", &self.connections.count())
            .finish()
    }
}

impl ChatEngine {
    /// Builds an engine with the in-process group registry.
    pub fn new(
        config: RealtimeConfig,
        identity: Arc<dyn IdentityResolver>,
        access: Arc<dyn AccessChecker>,
        store: Arc<dyn MessageStore>,
    ) -> Arc<Self> {
        let registry: Arc<dyn GroupRegistry> = Arc::new(MemoryGroupRegistry::new());
        Self::with_registry(config, identity, access, store, registry)
    }

    /// Builds an engine against an externally provided group registry
    /// (the seam for a distributed broker adapter).
    pub fn with_registry(
        config: RealtimeConfig,
        identity: Arc<dyn IdentityResolver>,
        access: Arc<dyn AccessChecker>,
        store: Arc<dyn MessageStore>,
        registry: Arc<dyn GroupRegistry>,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);

        let connections = Arc::new(ConnectionManager::new(config.outbound_buffer_size));
        let presence = Arc::new(PresenceTracker::new(
            registry.clone(),
            config.status_max_chars,
        ));
        let typing = Arc::new(TypingCoordinator::new(
            registry.clone(),
            std::time::Duration::from_secs(config.typing_expiry_seconds),
        ));
        let receipts = Arc::new(ReadReceiptTracker::new(store.clone(), registry.clone()));
        let relay = Arc::new(MessageRelay::new(
            store.clone(),
            registry.clone(),
            receipts.clone(),
        ));

        info!("Chat engine initialized");

        Arc::new(Self {
            config,
            connections,
            registry,
            presence,
            typing,
            relay,
            receipts,
            store,
            access,
            identity,
            shutdown_tx,
        })
    }

    /// Opens a session for one connection attempt.
    ///
    /// Runs authentication, the channel access check, group joins, the
    /// presence-online transition, and the connect snapshot. On failure no
    /// group membership or presence effect survives.
    pub async fn open_session(
        self: &Arc<Self>,
        credential: Option<&str>,
        channel_id: ChannelId,
    ) -> AppResult<(Arc<ChatSession>, mpsc::Receiver<OutboundEvent>)> {
        ChatSession::open(self.clone(), credential, channel_id).await
    }

    /// Number of live connections in this process.
    pub fn open_connections(&self) -> usize {
        self.connections.count()
    }

    /// Number of users currently online.
    pub fn online_users(&self) -> usize {
        self.presence.online_count()
    }

    /// A receiver observing the shutdown broadcast.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown: every live connection is flagged for
    /// closure and background listeners are signalled.
    pub fn shutdown(&self) {
        info!(
            connections = self.connections.count(),
            "Shutting down chat engine"
        );
        let _ = self.shutdown_tx.send(());
        self.connections.close_all(CloseReason::ServerShutdown);
    }
}
