//! # parlor-realtime
//!
//! Real-time chat engine for the Parlor gateway. Provides:
//!
//! - Per-connection session state machines with in-band authentication
//! - Broadcast groups behind a registry trait, with an in-process adapter
//! - Persist-then-broadcast message relay with echo suppression
//! - Presence tracking (online/offline edges, status text, multi-device)
//! - Self-expiring typing indicators
//! - Monotonic read receipts

pub mod connection;
pub mod engine;
pub mod events;
pub mod groups;
pub mod presence;
pub mod receipts;
pub mod relay;
pub mod session;
pub mod typing;

pub use connection::{CloseReason, ConnectionHandle, ConnectionId, ConnectionManager};
pub use engine::ChatEngine;
pub use events::{InboundEvent, MessagePayload, OnlineUser, OutboundEvent};
pub use groups::{GroupEvent, GroupName, GroupRegistry, MemoryGroupRegistry};
pub use presence::PresenceTracker;
pub use receipts::{MarkOutcome, ReadReceiptTracker};
pub use relay::MessageRelay;
pub use session::{ChatSession, SessionState};
pub use typing::TypingCoordinator;
