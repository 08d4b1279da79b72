//! In-memory message store with read tracking.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use parlor_core::error::AppError;
use parlor_core::result::AppResult;
use parlor_core::traits::store::MessageStore;
use parlor_core::types::{
    ChannelId, ChannelSnapshot, MessageId, MessageRecord, NewMessage, StoredMessage, UserId,
};

use crate::directory::Directory;

/// Append-only per-channel message log plus read sets, all behind DashMaps.
///
/// Serves as the reference [`MessageStore`] for single-process deployments
/// and tests.
pub struct InMemoryMessageStore {
    directory: Arc<Directory>,
    /// Channel id → messages in append order.
    messages: DashMap<ChannelId, Vec<StoredMessage>>,
    /// Message id → owning channel, for O(1) lookup.
    index: DashMap<MessageId, ChannelId>,
    /// Message id → users who have read it.
    reads: DashMap<MessageId, HashSet<UserId>>,
}

impl InMemoryMessageStore {
    /// Creates an empty store over the given directory.
    pub fn new(directory: Arc<Directory>) -> Self {
        Self {
            directory,
            messages: DashMap::new(),
            index: DashMap::new(),
            reads: DashMap::new(),
        }
    }

    /// Total number of stored messages. Test/diagnostic helper.
    pub fn message_count(&self) -> usize {
        self.messages.iter().map(|entry| entry.len()).sum()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: NewMessage) -> AppResult<StoredMessage> {
        if self.directory.channel(message.channel_id).is_none() {
            return Err(AppError::not_found(format!(
                "Unknown channel: {}",
                message.channel_id
            )));
        }

        let mut log = self.messages.entry(message.channel_id).or_default();

        // Creation timestamps are strictly increasing within a channel so
        // read pointers can order by time alone.
        let mut created_at = Utc::now();
        if let Some(last) = log.last() {
            if created_at <= last.created_at {
                created_at = last.created_at + Duration::microseconds(1);
            }
        }

        let stored = StoredMessage {
            id: MessageId::new(),
            channel_id: message.channel_id,
            tenant_id: message.tenant_id,
            sender: message.sender,
            content: message.content,
            content_type: message.content_type,
            created_at,
        };

        self.index.insert(stored.id, stored.channel_id);
        log.push(stored.clone());
        Ok(stored)
    }

    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> AppResult<Vec<MessageRecord>> {
        let Some(log) = self.messages.get(&channel_id) else {
            return Ok(Vec::new());
        };

        let records = log
            .iter()
            .rev()
            .take(limit)
            .map(|message| {
                let read_by = self
                    .reads
                    .get(&message.id)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default();
                MessageRecord {
                    message: message.clone(),
                    read_by,
                }
            })
            .collect();

        Ok(records)
    }

    async fn find_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> AppResult<Option<StoredMessage>> {
        let Some(owner) = self.index.get(&message_id) else {
            return Ok(None);
        };
        if *owner != channel_id {
            return Ok(None);
        }
        drop(owner);

        let Some(log) = self.messages.get(&channel_id) else {
            return Ok(None);
        };
        Ok(log.iter().find(|m| m.id == message_id).cloned())
    }

    async fn latest_message(&self, channel_id: ChannelId) -> AppResult<Option<StoredMessage>> {
        Ok(self
            .messages
            .get(&channel_id)
            .and_then(|log| log.last().cloned()))
    }

    async fn messages_since(
        &self,
        channel_id: ChannelId,
        after: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<StoredMessage>> {
        let Some(log) = self.messages.get(&channel_id) else {
            return Ok(Vec::new());
        };

        let messages = log
            .iter()
            .filter(|m| match after {
                Some(cutoff) => m.created_at > cutoff,
                None => true,
            })
            .cloned()
            .collect();

        Ok(messages)
    }

    async fn record_read(&self, user_id: UserId, message_id: MessageId) -> AppResult<bool> {
        if !self.index.contains_key(&message_id) {
            return Err(AppError::not_found(format!(
                "Unknown message: {message_id}"
            )));
        }

        let mut set = self.reads.entry(message_id).or_default();
        Ok(set.insert(user_id))
    }

    async fn channel_info(&self, channel_id: ChannelId) -> AppResult<Option<ChannelSnapshot>> {
        Ok(self.directory.channel_snapshot(channel_id))
    }
}
