//! Message store / read-model trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;
use crate::types::channel::ChannelSnapshot;
use crate::types::id::{ChannelId, MessageId, UserId};
use crate::types::message::{MessageRecord, NewMessage, StoredMessage};

/// Persistence boundary for messages, read state, and channel snapshots.
///
/// The gateway relays what this trait persists and never sees the storage
/// format. Failures map to the `Store` error kind; the caller decides
/// whether they surface to a client or are logged and swallowed.
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// Persist a new message and return it with its assigned id and
    /// creation timestamp. Relaying must not happen before this returns.
    async fn append(&self, message: NewMessage) -> AppResult<StoredMessage>;

    /// The most recent messages of a channel, newest first, with their
    /// read-by lists. Used for the connect backlog.
    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> AppResult<Vec<MessageRecord>>;

    /// Look up a single message, scoped to a channel. Returns `None` when
    /// the message does not exist or belongs to a different channel.
    async fn find_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> AppResult<Option<StoredMessage>>;

    /// The newest message of a channel, if any.
    async fn latest_message(&self, channel_id: ChannelId) -> AppResult<Option<StoredMessage>>;

    /// Messages of a channel strictly newer than `after`, oldest first.
    /// `None` means "from the beginning".
    async fn messages_since(
        &self,
        channel_id: ChannelId,
        after: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<StoredMessage>>;

    /// Record that `user_id` has read `message_id`. Returns `true` only the
    /// first time this pair is recorded; repeats return `false`.
    async fn record_read(&self, user_id: UserId, message_id: MessageId) -> AppResult<bool>;

    /// Read-only channel metadata, or `None` for an unknown channel.
    async fn channel_info(&self, channel_id: ChannelId) -> AppResult<Option<ChannelSnapshot>>;
}
