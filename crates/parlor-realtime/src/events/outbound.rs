//! Server-to-client frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parlor_core::error::AppError;
use parlor_core::types::{ChannelId, ChannelSnapshot, MessageId, StoredMessage, UserId};

/// Chat message as delivered on the wire and in history backlogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub content: String,
    pub content_type: String,
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub timestamp: DateTime<Utc>,
    /// Users who have read the message so far.
    pub read_by: Vec<UserId>,
}

impl MessagePayload {
    /// Builds the wire payload for a persisted message.
    pub fn from_stored(message: &StoredMessage, read_by: Vec<UserId>) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            content: message.content.clone(),
            content_type: message.content_type.clone(),
            user_id: message.sender.user_id,
            username: message.sender.username.clone(),
            display_name: message.sender.display_name.clone(),
            timestamp: message.created_at,
            read_by,
        }
    }
}

/// One entry in the online-users snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineUser {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_emoji: Option<String>,
}

/// Frames the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundEvent {
    /// New chat message in the channel.
    #[serde(rename = "chat.message")]
    ChatMessage { message: MessagePayload },
    /// Another participant started or stopped typing.
    #[serde(rename = "typing")]
    Typing { user_id: UserId, is_typing: bool },
    /// First read of a message by a user.
    #[serde(rename = "message.read")]
    MessageRead {
        message_id: MessageId,
        user_id: UserId,
    },
    /// A user's connection joined the channel.
    #[serde(rename = "user.join")]
    UserJoin {
        user_id: UserId,
        username: String,
        timestamp: DateTime<Utc>,
    },
    /// A user's connection left the channel.
    #[serde(rename = "user.leave")]
    UserLeave {
        user_id: UserId,
        username: String,
        timestamp: DateTime<Utc>,
    },
    /// Presence diff for a user in the tenant.
    #[serde(rename = "presence.update")]
    PresenceUpdate {
        user_id: UserId,
        is_online: bool,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        status_emoji: Option<String>,
        #[serde(default)]
        last_seen: Option<DateTime<Utc>>,
    },
    /// Channel metadata snapshot, sent once on connect.
    #[serde(rename = "channel.info")]
    ChannelInfo { channel: ChannelSnapshot },
    /// Recent message backlog, newest first, sent once on connect.
    #[serde(rename = "messages.history")]
    MessagesHistory { messages: Vec<MessagePayload> },
    /// Who in the tenant is online right now, sent once on connect. The
    /// connecting user is not listed.
    #[serde(rename = "online.users")]
    OnlineUsers { users: Vec<OnlineUser> },
    /// Reply to an inbound `heartbeat`.
    #[serde(rename = "heartbeat.ack")]
    HeartbeatAck { timestamp: DateTime<Utc> },
    /// Recoverable failure report; the connection stays open.
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl OutboundEvent {
    /// Error event carrying the application error's machine code.
    pub fn from_error(err: &AppError) -> Self {
        Self::Error {
            code: err.kind.to_string(),
            message: err.message.clone(),
        }
    }

    /// The wire `type` tag, for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            OutboundEvent::ChatMessage { .. } => "chat.message",
            OutboundEvent::Typing { .. } => "typing",
            OutboundEvent::MessageRead { .. } => "message.read",
            OutboundEvent::UserJoin { .. } => "user.join",
            OutboundEvent::UserLeave { .. } => "user.leave",
            OutboundEvent::PresenceUpdate { .. } => "presence.update",
            OutboundEvent::ChannelInfo { .. } => "channel.info",
            OutboundEvent::MessagesHistory { .. } => "messages.history",
            OutboundEvent::OnlineUsers { .. } => "online.users",
            OutboundEvent::HeartbeatAck { .. } => "heartbeat.ack",
            OutboundEvent::Error { .. } => "error",
        }
    }
}
