//! Wire event definitions for the chat protocol.
//!
//! Both directions use internally tagged JSON with dotted `type` names
//! (`chat.message`, `message.read`, ...).

pub mod inbound;
pub mod outbound;

pub use inbound::{decode_frame, FrameDecode, InboundEvent};
pub use outbound::{MessagePayload, OnlineUser, OutboundEvent};
