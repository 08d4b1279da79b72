//! Typing indicators with self-expiring timers.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use parlor_core::types::{ChannelId, TenantId, UserId};

use crate::connection::ConnectionId;
use crate::events::OutboundEvent;
use crate::groups::{GroupEvent, GroupName, GroupRegistry};

/// One live typing flag.
struct TypingEntry {
    tenant_id: TenantId,
    origin: ConnectionId,
    /// Bumped on every refresh; an expiry task whose generation no longer
    /// matches lost a race against a refresh and must not broadcast.
    generation: u64,
    timer: AbortHandle,
}

impl Drop for TypingEntry {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Coordinates ephemeral typing flags per `(channel, user)` pair.
///
/// Exactly one expiry timer exists per pair; a refresh replaces the timer
/// instead of stacking a second one, so a burst of `is_typing: true` signals
/// produces one start broadcast and, later, exactly one stop broadcast.
/// Broadcast failures are logged and swallowed.
pub struct TypingCoordinator {
    registry: Arc<dyn GroupRegistry>,
    entries: DashMap<(ChannelId, UserId), TypingEntry>,
    expiry: Duration,
}

impl TypingCoordinator {
    pub fn new(registry: Arc<dyn GroupRegistry>, expiry: Duration) -> Self {
        Self {
            registry,
            entries: DashMap::new(),
            expiry,
        }
    }

    /// Applies a typing signal from a connection.
    ///
    /// `true` publishes a start broadcast on the first signal and silently
    /// refreshes the timer on repeats. `false` stops the indicator; with no
    /// live entry it is a no-op.
    pub async fn set_typing(
        self: &Arc<Self>,
        tenant_id: TenantId,
        channel_id: ChannelId,
        user_id: UserId,
        origin: ConnectionId,
        is_typing: bool,
    ) {
        if is_typing {
            self.start(tenant_id, channel_id, user_id, origin).await;
        } else {
            self.stop(channel_id, user_id).await;
        }
    }

    /// Drops the user's typing flag for a channel, broadcasting the stop if
    /// they were typing. Called on explicit `false`, expiry, and disconnect.
    pub async fn clear(&self, channel_id: ChannelId, user_id: UserId) {
        self.stop(channel_id, user_id).await;
    }

    /// Number of live typing flags.
    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    async fn start(
        self: &Arc<Self>,
        tenant_id: TenantId,
        channel_id: ChannelId,
        user_id: UserId,
        origin: ConnectionId,
    ) {
        let key = (channel_id, user_id);
        let mut fresh = false;

        let generation = {
            let mut entry = self.entries.entry(key).or_insert_with(|| {
                fresh = true;
                TypingEntry {
                    tenant_id,
                    origin,
                    generation: 0,
                    timer: spawn_noop(),
                }
            });
            entry.timer.abort();
            entry.generation += 1;
            entry.origin = origin;
            let generation = entry.generation;
            entry.timer = self.spawn_expiry(channel_id, user_id, generation);
            generation
        };

        debug!(
            channel_id = %channel_id,
            user_id = %user_id,
            generation,
            refreshed = !fresh,
            "Typing timer armed"
        );

        if fresh {
            self.broadcast(tenant_id, channel_id, user_id, Some(origin), true)
                .await;
        }
    }

    async fn stop(&self, channel_id: ChannelId, user_id: UserId) {
        let Some((_, entry)) = self.entries.remove(&(channel_id, user_id)) else {
            return;
        };
        self.broadcast(
            entry.tenant_id,
            channel_id,
            user_id,
            Some(entry.origin),
            false,
        )
        .await;
    }

    fn spawn_expiry(
        self: &Arc<Self>,
        channel_id: ChannelId,
        user_id: UserId,
        generation: u64,
    ) -> AbortHandle {
        let coordinator = Arc::clone(self);
        let expiry = self.expiry;
        tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            coordinator.expire(channel_id, user_id, generation).await;
        })
        .abort_handle()
    }

    /// Timer-fired stop. Only acts if the entry still carries the firing
    /// timer's generation; a racing refresh has already replaced it.
    async fn expire(&self, channel_id: ChannelId, user_id: UserId, generation: u64) {
        let key = (channel_id, user_id);
        let Some((_, entry)) = self
            .entries
            .remove_if(&key, |_, entry| entry.generation == generation)
        else {
            return;
        };
        debug!(
            channel_id = %channel_id,
            user_id = %user_id,
            "Typing flag expired"
        );
        self.broadcast(
            entry.tenant_id,
            channel_id,
            user_id,
            Some(entry.origin),
            false,
        )
        .await;
    }

    async fn broadcast(
        &self,
        tenant_id: TenantId,
        channel_id: ChannelId,
        user_id: UserId,
        origin: Option<ConnectionId>,
        is_typing: bool,
    ) {
        let group = GroupName::Typing {
            tenant_id,
            channel_id,
        };
        let event = OutboundEvent::Typing { user_id, is_typing };
        let group_event = match origin {
            Some(origin) => GroupEvent::from_connection(origin, event),
            None => GroupEvent::broadcast(event),
        };
        if let Err(err) = self.registry.publish(&group, group_event).await {
            warn!(
                channel_id = %channel_id,
                user_id = %user_id,
                error = %err,
                "Typing broadcast failed"
            );
        }
    }
}

/// Placeholder abort handle for entry construction; immediately replaced.
fn spawn_noop() -> AbortHandle {
    tokio::spawn(async {}).abort_handle()
}
