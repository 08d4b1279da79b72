//! Connection plumbing — handles, lifecycle manager, idle monitoring.

pub mod handle;
pub mod manager;
pub mod monitor;

pub use handle::{CloseReason, ConnectionHandle, ConnectionId};
pub use manager::ConnectionManager;
pub use monitor::run_idle_monitor;
