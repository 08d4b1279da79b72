//! In-process group registry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use parlor_core::result::AppResult;

use crate::connection::{ConnectionHandle, ConnectionId};

use super::name::GroupName;
use super::registry::{GroupEvent, GroupRegistry};

/// Single-process [`GroupRegistry`] backed by DashMaps.
///
/// Members are held as connection handles, so publishing is a direct
/// non-blocking enqueue per member. A member with a full queue is closed as
/// a slow consumer by its own handle; the publisher is never stalled.
#[derive(Debug, Default)]
pub struct MemoryGroupRegistry {
    /// Group → members.
    groups: DashMap<GroupName, HashMap<ConnectionId, Arc<ConnectionHandle>>>,
    /// Connection → groups it joined, for disconnect cleanup.
    memberships: DashMap<ConnectionId, HashSet<GroupName>>,
}

impl MemoryGroupRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of members in a group; zero for unknown groups.
    pub fn member_count(&self, group: &GroupName) -> usize {
        self.groups.get(group).map(|m| m.len()).unwrap_or(0)
    }

    fn remove_member(&self, group: &GroupName, connection_id: ConnectionId) {
        if let Some(mut members) = self.groups.get_mut(group) {
            members.remove(&connection_id);
            if members.is_empty() {
                drop(members);
                self.groups.remove(group);
            }
        }
    }
}

#[async_trait]
impl GroupRegistry for MemoryGroupRegistry {
    async fn join(&self, group: GroupName, handle: Arc<ConnectionHandle>) -> AppResult<()> {
        let connection_id = handle.id;
        self.groups
            .entry(group)
            .or_default()
            .insert(connection_id, handle);
        self.memberships
            .entry(connection_id)
            .or_default()
            .insert(group);

        debug!(conn_id = %connection_id, group = %group, "Joined group");
        Ok(())
    }

    async fn leave(&self, group: &GroupName, connection_id: ConnectionId) -> AppResult<()> {
        self.remove_member(group, connection_id);

        if let Some(mut joined) = self.memberships.get_mut(&connection_id) {
            joined.remove(group);
            if joined.is_empty() {
                drop(joined);
                self.memberships.remove(&connection_id);
            }
        }

        debug!(conn_id = %connection_id, group = %group, "Left group");
        Ok(())
    }

    async fn leave_all(&self, connection_id: ConnectionId) -> AppResult<()> {
        if let Some((_, joined)) = self.memberships.remove(&connection_id) {
            for group in &joined {
                self.remove_member(group, connection_id);
            }
            debug!(
                conn_id = %connection_id,
                groups = joined.len(),
                "Left all groups"
            );
        }
        Ok(())
    }

    async fn publish(&self, group: &GroupName, event: GroupEvent) -> AppResult<()> {
        // Clone the member list out so no shard lock is held while enqueuing.
        let members: Vec<Arc<ConnectionHandle>> = match self.groups.get(group) {
            Some(members) => members
                .values()
                .filter(|handle| Some(handle.id) != event.origin)
                .cloned()
                .collect(),
            None => return Ok(()),
        };

        let mut delivered = 0usize;
        for handle in &members {
            if handle.deliver(event.payload.clone()) {
                delivered += 1;
            }
        }

        debug!(
            group = %group,
            event = event.payload.event_type(),
            delivered,
            skipped = members.len() - delivered,
            "Published to group"
        );
        Ok(())
    }
}
