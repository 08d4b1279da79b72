//! Client-to-server frames.

use serde::{Deserialize, Serialize};

use parlor_core::types::MessageId;

/// Frames a client may send over an active connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundEvent {
    /// Post a message to the session's channel.
    #[serde(rename = "chat.message")]
    ChatMessage {
        content: String,
        #[serde(default)]
        content_type: Option<String>,
    },
    /// Typing indicator state.
    #[serde(rename = "typing")]
    Typing { is_typing: bool },
    /// Mark a single message as read.
    #[serde(rename = "message.read")]
    MessageRead { message_id: MessageId },
    /// Mark everything in the channel as read.
    #[serde(rename = "message.read_all")]
    MessageReadAll,
    /// Update the user's presence status text.
    #[serde(rename = "status.update")]
    StatusUpdate {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        status_emoji: Option<String>,
    },
    /// Client liveness probe; answered with `heartbeat.ack`.
    #[serde(rename = "heartbeat")]
    Heartbeat,
}

impl InboundEvent {
    /// Every `type` tag the server understands.
    pub const KNOWN_TYPES: &'static [&'static str] = &[
        "chat.message",
        "typing",
        "message.read",
        "message.read_all",
        "status.update",
        "heartbeat",
    ];
}

/// Outcome of decoding a raw text frame.
///
/// An unknown `type` tag is distinct from a malformed frame: unknown types
/// are skipped silently (forward compatibility), malformed frames earn the
/// client an `error` event.
#[derive(Debug)]
pub enum FrameDecode {
    /// A well-formed, known event.
    Event(InboundEvent),
    /// Valid JSON carrying a `type` the server does not know.
    UnknownType(String),
    /// Not valid JSON, or a known `type` with an invalid payload.
    Malformed(String),
}

/// Decodes a raw inbound frame, classifying failures.
pub fn decode_frame(raw: &str) -> FrameDecode {
    match serde_json::from_str::<InboundEvent>(raw) {
        Ok(event) => FrameDecode::Event(event),
        Err(err) => {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
                if let Some(tag) = value.get("type").and_then(|t| t.as_str()) {
                    if !InboundEvent::KNOWN_TYPES.contains(&tag) {
                        return FrameDecode::UnknownType(tag.to_string());
                    }
                }
            }
            FrameDecode::Malformed(err.to_string())
        }
    }
}
