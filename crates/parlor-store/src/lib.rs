//! # parlor-store
//!
//! In-memory reference implementations of the collaborator traits the
//! gateway consumes:
//!
//! - [`Directory`] — tenants, users, and channels with participants
//! - [`DirectoryAccessChecker`] — participant + tenant membership checks
//! - [`DirectoryIdentityResolver`] — token verification backed by the
//!   directory (active flag, tenant match)
//! - [`InMemoryMessageStore`] — per-channel message log with read tracking
//! - [`seed`] — TOML fixture loader for dev and test bootstrap
//!
//! A production deployment swaps these for database-backed implementations
//! of the same `parlor-core` traits; nothing above the trait boundary
//! notices.

pub mod access;
pub mod directory;
pub mod identity;
pub mod messages;
pub mod seed;

pub use access::DirectoryAccessChecker;
pub use directory::{ChannelRecord, Directory, TenantRecord, UserRecord};
pub use identity::DirectoryIdentityResolver;
pub use messages::InMemoryMessageStore;
pub use seed::SeedFile;
