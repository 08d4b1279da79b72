//! Collaborator traits defined in `parlor-core` and implemented by other
//! crates. The gateway core only ever talks to these seams; swapping a
//! database-backed implementation for the in-memory one changes nothing
//! above this boundary.

pub mod access;
pub mod identity;
pub mod store;

pub use access::AccessChecker;
pub use identity::{IdentityResolver, ResolvedIdentity};
pub use store::MessageStore;
