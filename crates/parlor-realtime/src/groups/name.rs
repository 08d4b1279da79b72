//! Group naming scheme.

use std::fmt;
use std::str::FromStr;

use parlor_core::error::AppError;
use parlor_core::types::{ChannelId, TenantId, UserId};

/// Name of a broadcast group.
///
/// Every variant carries the tenant, so cross-tenant delivery is impossible
/// by construction. Names render to stable topic strings
/// (`chat:{tenant}:{channel}`, ...) that a distributed broker adapter could
/// carry on a bus unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupName {
    /// Chat traffic for one channel: messages, read receipts, join/leave.
    Chat {
        tenant_id: TenantId,
        channel_id: ChannelId,
    },
    /// Typing indicators for one channel.
    Typing {
        tenant_id: TenantId,
        channel_id: ChannelId,
    },
    /// Tenant-wide presence diffs.
    Presence { tenant_id: TenantId },
    /// All connections of one user (multi-device fan-in).
    User {
        tenant_id: TenantId,
        user_id: UserId,
    },
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupName::Chat {
                tenant_id,
                channel_id,
            } => write!(f, "chat:{tenant_id}:{channel_id}"),
            GroupName::Typing {
                tenant_id,
                channel_id,
            } => write!(f, "typing:{tenant_id}:{channel_id}"),
            GroupName::Presence { tenant_id } => write!(f, "presence:{tenant_id}"),
            GroupName::User { tenant_id, user_id } => write!(f, "user:{tenant_id}:{user_id}"),
        }
    }
}

impl FromStr for GroupName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation(format!("Invalid group name: {s}"));
        let mut parts = s.split(':');

        let name = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("chat"), Some(tenant), Some(channel), None) => GroupName::Chat {
                tenant_id: tenant.parse().map_err(|_| invalid())?,
                channel_id: channel.parse().map_err(|_| invalid())?,
            },
            (Some("typing"), Some(tenant), Some(channel), None) => GroupName::Typing {
                tenant_id: tenant.parse().map_err(|_| invalid())?,
                channel_id: channel.parse().map_err(|_| invalid())?,
            },
            (Some("presence"), Some(tenant), None, None) => GroupName::Presence {
                tenant_id: tenant.parse().map_err(|_| invalid())?,
            },
            (Some("user"), Some(tenant), Some(user), None) => GroupName::User {
                tenant_id: tenant.parse().map_err(|_| invalid())?,
                user_id: user.parse().map_err(|_| invalid())?,
            },
            _ => return Err(invalid()),
        };
        Ok(name)
    }
}
