//! Channel access checking trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::{ChannelId, UserId};

/// Answers whether a user may join a channel.
///
/// The gateway consults this once per connection attempt, after identity
/// resolution. Implementations typically check channel participation; they
/// must never grant access across tenant boundaries.
#[async_trait]
pub trait AccessChecker: Send + Sync + 'static {
    /// Whether `user_id` may join `channel_id`.
    async fn may_join(&self, user_id: UserId, channel_id: ChannelId) -> AppResult<bool>;
}
