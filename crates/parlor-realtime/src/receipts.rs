//! Read-receipt tracking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use parlor_core::result::AppResult;
use parlor_core::traits::MessageStore;
use parlor_core::types::{ChannelId, MessageId, StoredMessage, TenantId, UserId};

use crate::connection::ConnectionId;
use crate::events::OutboundEvent;
use crate::groups::{GroupEvent, GroupName, GroupRegistry};

/// Outcome of a single-message mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// First read by this user; a receipt was broadcast.
    Updated,
    /// Already read, unknown message, or message outside the channel.
    NotUpdated,
}

/// Tracks per-user read pointers and broadcasts first-read receipts.
///
/// The pointer for `(channel, user)` is the creation time of the newest
/// message the user has read. It only moves forward; durable read state
/// lives in the store.
pub struct ReadReceiptTracker {
    store: Arc<dyn MessageStore>,
    registry: Arc<dyn GroupRegistry>,
    pointers: DashMap<(ChannelId, UserId), DateTime<Utc>>,
}

impl ReadReceiptTracker {
    pub fn new(store: Arc<dyn MessageStore>, registry: Arc<dyn GroupRegistry>) -> Self {
        Self {
            store,
            registry,
            pointers: DashMap::new(),
        }
    }

    /// Marks one message read for a user.
    ///
    /// Broadcasts `message.read` to the channel's chat group only on the
    /// user's first read of that message. Unknown messages and messages
    /// belonging to another channel are silently not updated.
    pub async fn mark_read(
        &self,
        origin: ConnectionId,
        tenant_id: TenantId,
        channel_id: ChannelId,
        user_id: UserId,
        message_id: MessageId,
    ) -> AppResult<MarkOutcome> {
        let Some(message) = self.store.find_message(channel_id, message_id).await? else {
            debug!(
                channel_id = %channel_id,
                message_id = %message_id,
                "Read mark for unknown message ignored"
            );
            return Ok(MarkOutcome::NotUpdated);
        };

        let first_read = self.store.record_read(user_id, message_id).await?;
        self.advance_pointer(channel_id, user_id, message.created_at);

        if !first_read {
            return Ok(MarkOutcome::NotUpdated);
        }

        let group = GroupName::Chat {
            tenant_id,
            channel_id,
        };
        self.registry
            .publish(
                &group,
                GroupEvent::from_connection(
                    origin,
                    OutboundEvent::MessageRead {
                        message_id,
                        user_id,
                    },
                ),
            )
            .await?;

        Ok(MarkOutcome::Updated)
    }

    /// Marks every message up to the channel's current latest as read.
    ///
    /// The latest message is captured first; anything appended while the
    /// marks run stays unread. Returns how many messages were newly covered.
    /// Bulk marks do not broadcast receipts.
    pub async fn mark_all_read(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> AppResult<usize> {
        let Some(latest) = self.store.latest_message(channel_id).await? else {
            return Ok(0);
        };

        let after = self
            .pointers
            .get(&(channel_id, user_id))
            .map(|entry| *entry.value());
        let pending = self.store.messages_since(channel_id, after).await?;

        let mut covered = 0usize;
        for message in pending
            .iter()
            .filter(|m| m.created_at <= latest.created_at)
        {
            if self.store.record_read(user_id, message.id).await? {
                covered += 1;
            }
        }

        self.advance_pointer(channel_id, user_id, latest.created_at);
        debug!(
            channel_id = %channel_id,
            user_id = %user_id,
            covered,
            "Marked all read"
        );
        Ok(covered)
    }

    /// Records the author's own read of a message they just sent, without
    /// broadcasting.
    pub async fn note_own_message(
        &self,
        user_id: UserId,
        message: &StoredMessage,
    ) -> AppResult<()> {
        self.store.record_read(user_id, message.id).await?;
        self.advance_pointer(message.channel_id, user_id, message.created_at);
        Ok(())
    }

    /// Current pointer position, if the user has read anything.
    pub fn pointer(&self, channel_id: ChannelId, user_id: UserId) -> Option<DateTime<Utc>> {
        self.pointers
            .get(&(channel_id, user_id))
            .map(|entry| *entry.value())
    }

    fn advance_pointer(&self, channel_id: ChannelId, user_id: UserId, read_at: DateTime<Utc>) {
        self.pointers
            .entry((channel_id, user_id))
            .and_modify(|current| {
                if read_at > *current {
                    *current = read_at;
                }
            })
            .or_insert(read_at);
    }
}
