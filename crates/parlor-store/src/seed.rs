//! Directory seeding from a TOML fixture file.
//!
//! Deployments without a real identity backend describe their tenants,
//! users, and channels in a seed file referenced by `directory.seed_file`.
//! Entries reference each other by name so fixtures stay readable:
//!
//! ```toml
//! [[tenants]]
//! name = "acme"
//!
//! [[users]]
//! tenant = "acme"
//! username = "ada"
//! display_name = "Ada Lovelace"
//!
//! [[channels]]
//! tenant = "acme"
//! name = "general"
//! kind = "group"
//! participants = ["ada"]
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use parlor_core::error::AppError;
use parlor_core::result::AppResult;
use parlor_core::types::ChannelKind;

use crate::directory::Directory;

/// Parsed seed fixture.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub tenants: Vec<SeedTenant>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub channels: Vec<SeedChannel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedTenant {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    /// Tenant name this user belongs to.
    pub tenant: String,
    pub username: String,
    pub display_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedChannel {
    /// Tenant name this channel belongs to.
    pub tenant: String,
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: ChannelKind,
    /// Participant usernames, resolved within the channel's tenant.
    #[serde(default)]
    pub participants: Vec<String>,
}

fn default_active() -> bool {
    true
}

fn default_kind() -> ChannelKind {
    ChannelKind::Group
}

/// Counts of what a seed application created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub tenants: usize,
    pub users: usize,
    pub channels: usize,
}

impl SeedFile {
    /// Loads and parses a seed file from disk.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        raw.try_deserialize().map_err(AppError::from)
    }

    /// Parses a seed fixture from an in-memory TOML string.
    pub fn parse(source: &str) -> AppResult<Self> {
        let raw = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        raw.try_deserialize().map_err(AppError::from)
    }

    /// Materializes the fixture into a directory.
    ///
    /// Name references are resolved as entries are created, so tenants must
    /// come before the users and channels that mention them. Unknown
    /// references are validation errors.
    pub fn apply(&self, directory: &Directory) -> AppResult<SeedSummary> {
        for tenant in &self.tenants {
            if directory.tenant_by_name(&tenant.name).is_some() {
                return Err(AppError::validation(format!(
                    "Duplicate tenant in seed file: {}",
                    tenant.name
                )));
            }
            directory.add_tenant(tenant.name.clone());
        }

        for user in &self.users {
            let tenant = directory.tenant_by_name(&user.tenant).ok_or_else(|| {
                AppError::validation(format!(
                    "User {} references unknown tenant: {}",
                    user.username, user.tenant
                ))
            })?;
            if directory.user_by_name(tenant.id, &user.username).is_some() {
                return Err(AppError::validation(format!(
                    "Duplicate username in seed file: {}",
                    user.username
                )));
            }
            let record =
                directory.add_user(tenant.id, user.username.clone(), user.display_name.clone())?;
            if !user.active {
                directory.set_active(record.id, false)?;
            }
        }

        for channel in &self.channels {
            let tenant = directory.tenant_by_name(&channel.tenant).ok_or_else(|| {
                AppError::validation(format!(
                    "Channel {} references unknown tenant: {}",
                    channel.name, channel.tenant
                ))
            })?;
            let mut participants = Vec::with_capacity(channel.participants.len());
            for username in &channel.participants {
                let user = directory.user_by_name(tenant.id, username).ok_or_else(|| {
                    AppError::validation(format!(
                        "Channel {} references unknown user: {username}",
                        channel.name
                    ))
                })?;
                participants.push(user.id);
            }
            directory.create_channel(tenant.id, channel.name.clone(), channel.kind, participants)?;
        }

        let summary = SeedSummary {
            tenants: self.tenants.len(),
            users: self.users.len(),
            channels: self.channels.len(),
        };
        info!(
            tenants = summary.tenants,
            users = summary.users,
            channels = summary.channels,
            "Directory seeded"
        );
        Ok(summary)
    }
}
