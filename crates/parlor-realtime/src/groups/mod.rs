//! Broadcast groups — named fan-out sets of connections.

pub mod memory;
pub mod name;
pub mod registry;

pub use memory::MemoryGroupRegistry;
pub use name::GroupName;
pub use registry::{GroupEvent, GroupRegistry};
