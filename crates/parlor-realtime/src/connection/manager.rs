//! Connection manager — tracks every live connection in the process.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::info;

use parlor_core::traits::ResolvedIdentity;

use crate::events::OutboundEvent;

use super::handle::{CloseReason, ConnectionHandle, ConnectionId};

/// Thread-safe registry of all active connections.
#[derive(Debug)]
pub struct ConnectionManager {
    connections: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// Capacity of each connection's outbound queue.
    buffer_size: usize,
}

impl ConnectionManager {
    /// Creates an empty manager; `buffer_size` bounds each outbound queue.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            connections: DashMap::new(),
            buffer_size,
        }
    }

    /// Registers a new authenticated connection.
    ///
    /// Returns the handle and the receiver the socket writer drains.
    pub fn register(
        &self,
        identity: &ResolvedIdentity,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundEvent>) {
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let handle = Arc::new(ConnectionHandle::new(identity, tx));
        self.connections.insert(handle.id, handle.clone());

        info!(
            conn_id = %handle.id,
            user_id = %handle.user_id,
            tenant_id = %handle.tenant_id,
            "Connection registered"
        );
        (handle, rx)
    }

    /// Removes a connection from the registry.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections.remove(&connection_id).map(|(_, handle)| {
            info!(
                conn_id = %connection_id,
                user_id = %handle.user_id,
                "Connection unregistered"
            );
            handle
        })
    }

    /// Looks up a connection by id.
    pub fn get(&self, connection_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections
            .get(&connection_id)
            .map(|entry| entry.value().clone())
    }

    /// Snapshot of all live handles.
    pub fn all(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of live connections.
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Initiates a close on every live connection.
    pub fn close_all(&self, reason: CloseReason) {
        let handles = self.all();
        for handle in &handles {
            handle.begin_close(reason);
        }
        if !handles.is_empty() {
            info!(count = handles.len(), reason = %reason, "Closing all connections");
        }
    }
}
