//! Message records exchanged with the message store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{ChannelId, MessageId, TenantId, UserId};

/// Default content type when a client omits one.
pub const DEFAULT_CONTENT_TYPE: &str = "text";

/// Sender metadata denormalized onto every stored message so history can be
/// rendered without a user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderInfo {
    /// Sending user id.
    pub user_id: UserId,
    /// Login name at send time.
    pub username: String,
    /// Human-readable name at send time.
    pub display_name: String,
}

/// A message handed to the store for persistence.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Target channel.
    pub channel_id: ChannelId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Sender metadata.
    pub sender: SenderInfo,
    /// Message body.
    pub content: String,
    /// Content type (`"text"` unless the client says otherwise).
    pub content_type: String,
}

/// A persisted message as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Store-assigned message id.
    pub id: MessageId,
    /// Channel the message belongs to.
    pub channel_id: ChannelId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Sender metadata.
    pub sender: SenderInfo,
    /// Message body.
    pub content: String,
    /// Content type.
    pub content_type: String,
    /// Persist timestamp; per-channel delivery order follows it.
    pub created_at: DateTime<Utc>,
}

/// Read-model row: a stored message plus the users who have read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// The persisted message.
    pub message: StoredMessage,
    /// Users that have recorded a read for this message.
    pub read_by: Vec<UserId>,
}
