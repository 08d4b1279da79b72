//! Presence tracking — online/offline edges and status text.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use parlor_core::traits::ResolvedIdentity;
use parlor_core::types::{TenantId, UserId};

use crate::events::{OnlineUser, OutboundEvent};
use crate::groups::{GroupEvent, GroupName, GroupRegistry};

/// Presence state for one user.
#[derive(Debug, Clone)]
struct PresenceEntry {
    tenant_id: TenantId,
    username: String,
    display_name: String,
    is_online: bool,
    last_seen: Option<DateTime<Utc>>,
    status: String,
    status_emoji: String,
    /// Live connections for this user; online/offline diffs fire only on
    /// the 0↔1 edges, so a second device is silent.
    connections: usize,
}

/// Owns all presence state; connection tasks call methods and never touch
/// the maps directly.
///
/// Diffs publish to the tenant presence group and to the user's private
/// group, so the user's other devices see their own transitions. Publish
/// failures are logged and swallowed; no client waits on a presence
/// broadcast.
pub struct PresenceTracker {
    registry: Arc<dyn GroupRegistry>,
    entries: DashMap<UserId, PresenceEntry>,
    /// Character cap for status and status emoji.
    status_max_chars: usize,
}

impl PresenceTracker {
    pub fn new(registry: Arc<dyn GroupRegistry>, status_max_chars: usize) -> Self {
        Self {
            registry,
            entries: DashMap::new(),
            status_max_chars,
        }
    }

    /// Records a new connection for a user.
    ///
    /// On the user's first live connection, marks them online, clears
    /// `last_seen`, and publishes a diff. Additional connections change
    /// nothing and broadcast nothing.
    pub async fn connection_opened(&self, identity: &ResolvedIdentity) {
        let diff = {
            let mut entry = self
                .entries
                .entry(identity.user_id)
                .or_insert_with(|| PresenceEntry {
                    tenant_id: identity.tenant_id,
                    username: identity.username.clone(),
                    display_name: identity.display_name.clone(),
                    is_online: false,
                    last_seen: None,
                    status: String::new(),
                    status_emoji: String::new(),
                    connections: 0,
                });
            entry.connections += 1;
            if entry.is_online {
                None
            } else {
                entry.is_online = true;
                entry.last_seen = None;
                Some(self.diff_event(identity.user_id, &entry))
            }
        };

        if let Some(event) = diff {
            debug!(user_id = %identity.user_id, "User online");
            self.publish_diff(identity.tenant_id, identity.user_id, event)
                .await;
        }
    }

    /// Records a closed connection for a user.
    ///
    /// When the last connection closes, marks the user offline, stamps
    /// `last_seen`, and publishes a diff.
    pub async fn connection_closed(&self, user_id: UserId) {
        let diff = {
            let Some(mut entry) = self.entries.get_mut(&user_id) else {
                return;
            };
            entry.connections = entry.connections.saturating_sub(1);
            if entry.connections > 0 || !entry.is_online {
                None
            } else {
                entry.is_online = false;
                entry.last_seen = Some(Utc::now());
                Some((entry.tenant_id, self.diff_event(user_id, &entry)))
            }
        };

        if let Some((tenant_id, event)) = diff {
            debug!(user_id = %user_id, "User offline");
            self.publish_diff(tenant_id, user_id, event).await;
        }
    }

    /// Updates a user's status text and emoji.
    ///
    /// Both fields are truncated to the configured character limit. Nothing
    /// is published when neither field actually changed. Never flips the
    /// online flag.
    pub async fn update_status(
        &self,
        identity: &ResolvedIdentity,
        status: Option<String>,
        status_emoji: Option<String>,
    ) {
        let status = status.map(|s| truncate_chars(&s, self.status_max_chars));
        let status_emoji = status_emoji.map(|s| truncate_chars(&s, self.status_max_chars));

        let diff = {
            let mut entry = self
                .entries
                .entry(identity.user_id)
                .or_insert_with(|| PresenceEntry {
                    tenant_id: identity.tenant_id,
                    username: identity.username.clone(),
                    display_name: identity.display_name.clone(),
                    is_online: false,
                    last_seen: None,
                    status: String::new(),
                    status_emoji: String::new(),
                    connections: 0,
                });

            let mut changed = false;
            if let Some(status) = status {
                if status != entry.status {
                    entry.status = status;
                    changed = true;
                }
            }
            if let Some(emoji) = status_emoji {
                if emoji != entry.status_emoji {
                    entry.status_emoji = emoji;
                    changed = true;
                }
            }

            changed.then(|| self.diff_event(identity.user_id, &entry))
        };

        if let Some(event) = diff {
            self.publish_diff(identity.tenant_id, identity.user_id, event)
                .await;
        }
    }

    /// Whether a user currently counts as online.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.entries
            .get(&user_id)
            .map(|entry| entry.is_online)
            .unwrap_or(false)
    }

    /// Number of users currently online.
    pub fn online_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_online).count()
    }

    /// Snapshot of who is online in a tenant, ordered by username.
    ///
    /// `exclude` leaves out the asking user, so a connect snapshot lists
    /// only the peers that were already there.
    pub fn online_users(&self, tenant_id: TenantId, exclude: UserId) -> Vec<OnlineUser> {
        let mut users: Vec<OnlineUser> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.is_online && entry.tenant_id == tenant_id && *entry.key() != exclude
            })
            .map(|entry| OnlineUser {
                user_id: *entry.key(),
                username: entry.username.clone(),
                display_name: entry.display_name.clone(),
                status: (!entry.status.is_empty()).then(|| entry.status.clone()),
                status_emoji: (!entry.status_emoji.is_empty()).then(|| entry.status_emoji.clone()),
            })
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    /// When the user was last seen, if they have gone offline before.
    pub fn last_seen(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        self.entries.get(&user_id).and_then(|entry| entry.last_seen)
    }

    fn diff_event(&self, user_id: UserId, entry: &PresenceEntry) -> OutboundEvent {
        OutboundEvent::PresenceUpdate {
            user_id,
            is_online: entry.is_online,
            status: (!entry.status.is_empty()).then(|| entry.status.clone()),
            status_emoji: (!entry.status_emoji.is_empty()).then(|| entry.status_emoji.clone()),
            last_seen: entry.last_seen,
        }
    }

    async fn publish_diff(&self, tenant_id: TenantId, user_id: UserId, event: OutboundEvent) {
        let targets = [
            GroupName::Presence { tenant_id },
            GroupName::User { tenant_id, user_id },
        ];
        for group in targets {
            if let Err(err) = self
                .registry
                .publish(&group, GroupEvent::broadcast(event.clone()))
                .await
            {
                warn!(
                    group = %group,
                    user_id = %user_id,
                    error = %err,
                    "Presence diff publish failed"
                );
            }
        }
    }
}

/// Truncates to at most `max` characters, on a character boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
