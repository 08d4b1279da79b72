//! Tenant, user, and channel directory.
//!
//! The directory is the gateway's read-model of who exists and who may talk
//! where. Production deployments feed it from the platform database; here
//! it is an in-memory structure populated programmatically or from a seed
//! fixture.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use parlor_core::error::AppError;
use parlor_core::result::AppResult;
use parlor_core::types::{
    ChannelId, ChannelKind, ChannelSnapshot, ParticipantInfo, TenantId, UserId,
};

/// A tenant known to the directory.
#[derive(Debug, Clone)]
pub struct TenantRecord {
    /// Tenant id.
    pub id: TenantId,
    /// Tenant name (unique).
    pub name: String,
}

/// A user known to the directory.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// User id.
    pub id: UserId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Login name (unique within a tenant).
    pub username: String,
    /// Human-readable name.
    pub display_name: String,
    /// Inactive users cannot open connections.
    pub active: bool,
}

/// A channel known to the directory.
#[derive(Debug, Clone)]
pub struct ChannelRecord {
    /// Channel id.
    pub id: ChannelId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Channel taxonomy.
    pub kind: ChannelKind,
    /// Participant user ids.
    pub participants: Vec<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Concurrent in-memory directory of tenants, users, and channels.
#[derive(Debug, Default)]
pub struct Directory {
    tenants: DashMap<TenantId, TenantRecord>,
    users: DashMap<UserId, UserRecord>,
    channels: DashMap<ChannelId, ChannelRecord>,
}

impl Directory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tenant.
    pub fn add_tenant(&self, name: impl Into<String>) -> TenantRecord {
        let record = TenantRecord {
            id: TenantId::new(),
            name: name.into(),
        };
        self.tenants.insert(record.id, record.clone());
        record
    }

    /// Registers an active user under a tenant.
    pub fn add_user(
        &self,
        tenant_id: TenantId,
        username: impl Into<String>,
        display_name: impl Into<String>,
    ) -> AppResult<UserRecord> {
        if !self.tenants.contains_key(&tenant_id) {
            return Err(AppError::not_found(format!("Unknown tenant: {tenant_id}")));
        }
        let record = UserRecord {
            id: UserId::new(),
            tenant_id,
            username: username.into(),
            display_name: display_name.into(),
            active: true,
        };
        self.users.insert(record.id, record.clone());
        Ok(record)
    }

    /// Flips a user's active flag.
    pub fn set_active(&self, user_id: UserId, active: bool) -> AppResult<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("Unknown user: {user_id}")))?;
        user.active = active;
        Ok(())
    }

    /// Creates a channel with the given participants.
    pub fn create_channel(
        &self,
        tenant_id: TenantId,
        name: impl Into<String>,
        kind: ChannelKind,
        participants: Vec<UserId>,
    ) -> AppResult<ChannelRecord> {
        if !self.tenants.contains_key(&tenant_id) {
            return Err(AppError::not_found(format!("Unknown tenant: {tenant_id}")));
        }
        let record = ChannelRecord {
            id: ChannelId::new(),
            tenant_id,
            name: name.into(),
            kind,
            participants,
            created_at: Utc::now(),
        };
        self.channels.insert(record.id, record.clone());
        Ok(record)
    }

    /// Adds a participant to a channel. Idempotent.
    pub fn add_participant(&self, channel_id: ChannelId, user_id: UserId) -> AppResult<()> {
        let mut channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| AppError::not_found(format!("Unknown channel: {channel_id}")))?;
        if !channel.participants.contains(&user_id) {
            channel.participants.push(user_id);
        }
        Ok(())
    }

    /// Removes a participant from a channel. No-op for non-members.
    pub fn remove_participant(&self, channel_id: ChannelId, user_id: UserId) -> AppResult<()> {
        let mut channel = self
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| AppError::not_found(format!("Unknown channel: {channel_id}")))?;
        channel.participants.retain(|p| *p != user_id);
        Ok(())
    }

    /// Looks up a user.
    pub fn user(&self, user_id: UserId) -> Option<UserRecord> {
        self.users.get(&user_id).map(|u| u.clone())
    }

    /// Looks up a user by tenant and username.
    pub fn user_by_name(&self, tenant_id: TenantId, username: &str) -> Option<UserRecord> {
        self.users
            .iter()
            .find(|u| u.tenant_id == tenant_id && u.username == username)
            .map(|u| u.clone())
    }

    /// Looks up a channel.
    pub fn channel(&self, channel_id: ChannelId) -> Option<ChannelRecord> {
        self.channels.get(&channel_id).map(|c| c.clone())
    }

    /// Looks up a tenant by name.
    pub fn tenant_by_name(&self, name: &str) -> Option<TenantRecord> {
        self.tenants
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.clone())
    }

    /// Builds the read-only snapshot delivered as `channel.info`.
    ///
    /// Participants that have disappeared from the user table are skipped
    /// rather than failing the whole snapshot.
    pub fn channel_snapshot(&self, channel_id: ChannelId) -> Option<ChannelSnapshot> {
        let channel = self.channels.get(&channel_id)?;
        let participants = channel
            .participants
            .iter()
            .filter_map(|user_id| {
                self.users.get(user_id).map(|u| ParticipantInfo {
                    user_id: u.id,
                    username: u.username.clone(),
                    display_name: u.display_name.clone(),
                })
            })
            .collect();

        Some(ChannelSnapshot {
            id: channel.id,
            tenant_id: channel.tenant_id,
            name: channel.name.clone(),
            kind: channel.kind,
            participants,
            created_at: channel.created_at,
        })
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of registered channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
