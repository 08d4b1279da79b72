//! Channel records as seen by the gateway.
//!
//! The gateway does not own channels; it receives read-only snapshots from
//! the message store / read-model when a session connects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{ChannelId, TenantId, UserId};

/// How a channel came to exist. Mirrors the channel taxonomy of the
/// surrounding platform; the gateway only relays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// One-to-one conversation.
    Direct,
    /// Ad hoc multi-user conversation.
    Group,
    /// Conversation attached to another entity (deal, ticket, ...).
    Contextual,
}

/// A participant entry inside a [`ChannelSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// Participant user id.
    pub user_id: UserId,
    /// Login name.
    pub username: String,
    /// Human-readable name.
    pub display_name: String,
}

/// Read-only channel metadata delivered as the `channel.info` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Channel id.
    pub id: ChannelId,
    /// Owning tenant. Sessions may only join channels of their own tenant.
    pub tenant_id: TenantId,
    /// Display name of the channel.
    pub name: String,
    /// Channel taxonomy.
    pub kind: ChannelKind,
    /// Current participants.
    pub participants: Vec<ParticipantInfo>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl ChannelSnapshot {
    /// Whether the given user is a participant of this channel.
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }
}
