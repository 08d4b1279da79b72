//! Group registry abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use parlor_core::result::AppResult;

use crate::connection::{ConnectionHandle, ConnectionId};
use crate::events::OutboundEvent;

use super::name::GroupName;

/// An event published to a group.
#[derive(Debug, Clone)]
pub struct GroupEvent {
    /// Connection that caused the event. Delivery skips it, so authors never
    /// receive their own broadcasts (their other devices do).
    pub origin: Option<ConnectionId>,
    /// The frame to deliver.
    pub payload: OutboundEvent,
}

impl GroupEvent {
    /// Event delivered to every member.
    pub fn broadcast(payload: OutboundEvent) -> Self {
        Self {
            origin: None,
            payload,
        }
    }

    /// Event delivered to every member except the originating connection.
    pub fn from_connection(origin: ConnectionId, payload: OutboundEvent) -> Self {
        Self {
            origin: Some(origin),
            payload,
        }
    }
}

/// Membership and fan-out for named broadcast groups.
///
/// The trait is the seam for a distributed adapter; the in-process
/// [`MemoryGroupRegistry`](super::MemoryGroupRegistry) is the only shipped
/// implementation. Delivery is at-least-once: members joined at publish time
/// receive the event, and per-group publish order is preserved for a caller
/// that publishes in order.
#[async_trait]
pub trait GroupRegistry: Send + Sync + 'static {
    /// Adds a connection to a group, creating the group if needed.
    /// Joining a group twice is a no-op.
    async fn join(&self, group: GroupName, handle: Arc<ConnectionHandle>) -> AppResult<()>;

    /// Removes a connection from a group. Unknown group or non-member is a
    /// no-op. Groups left empty are dropped.
    async fn leave(&self, group: &GroupName, connection_id: ConnectionId) -> AppResult<()>;

    /// Removes a connection from every group it joined.
    async fn leave_all(&self, connection_id: ConnectionId) -> AppResult<()>;

    /// Delivers an event to every current member except the origin.
    /// Publishing to an unknown or empty group is a silent no-op.
    async fn publish(&self, group: &GroupName, event: GroupEvent) -> AppResult<()>;
}
