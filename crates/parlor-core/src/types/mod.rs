//! Domain types shared across the gateway.

pub mod channel;
pub mod id;
pub mod message;

pub use channel::{ChannelKind, ChannelSnapshot, ParticipantInfo};
pub use id::{ChannelId, MessageId, TenantId, UserId};
pub use message::{MessageRecord, NewMessage, SenderInfo, StoredMessage, DEFAULT_CONTENT_TYPE};
