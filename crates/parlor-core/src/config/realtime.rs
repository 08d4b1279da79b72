//! Real-time gateway configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound queue capacity. A connection that lets its
    /// queue fill up is closed rather than allowed to stall publishers.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Number of recent messages delivered when a session connects.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Seconds after the last typing signal before a typing indicator
    /// expires on its own.
    #[serde(default = "default_typing_expiry")]
    pub typing_expiry_seconds: u64,
    /// Seconds without any inbound frame before a connection is considered
    /// dead and closed. Heartbeats count as activity.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// How often the idle monitor checks connection activity.
    #[serde(default = "default_idle_check_interval")]
    pub idle_check_interval_seconds: u64,
    /// Maximum length, in characters, of presence status and status emoji.
    #[serde(default = "default_status_max_chars")]
    pub status_max_chars: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            history_limit: default_history_limit(),
            typing_expiry_seconds: default_typing_expiry(),
            idle_timeout_seconds: default_idle_timeout(),
            idle_check_interval_seconds: default_idle_check_interval(),
            status_max_chars: default_status_max_chars(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_history_limit() -> usize {
    50
}

fn default_typing_expiry() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    90
}

fn default_idle_check_interval() -> u64 {
    15
}

fn default_status_max_chars() -> usize {
    10
}
