//! Directory-backed channel access checker.

use std::sync::Arc;

use async_trait::async_trait;

use parlor_core::result::AppResult;
use parlor_core::traits::access::AccessChecker;
use parlor_core::types::{ChannelId, UserId};

use crate::directory::Directory;

/// Grants access when the user is a participant of the channel and both
/// belong to the same tenant. Unknown users and unknown channels are
/// simply denied, never errors.
pub struct DirectoryAccessChecker {
    directory: Arc<Directory>,
}

impl DirectoryAccessChecker {
    /// Creates a checker over the given directory.
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl AccessChecker for DirectoryAccessChecker {
    async fn may_join(&self, user_id: UserId, channel_id: ChannelId) -> AppResult<bool> {
        let Some(user) = self.directory.user(user_id) else {
            return Ok(false);
        };
        let Some(channel) = self.directory.channel(channel_id) else {
            return Ok(false);
        };

        Ok(user.tenant_id == channel.tenant_id && channel.participants.contains(&user_id))
    }
}
