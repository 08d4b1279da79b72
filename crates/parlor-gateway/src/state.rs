//! Application state shared across all handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use parlor_core::config::AppConfig;
use parlor_realtime::ChatEngine;

/// Shared dependencies, passed to every handler via Axum's `State`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Real-time chat engine.
    pub engine: Arc<ChatEngine>,
    /// Process start time, for health reporting.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, engine: Arc<ChatEngine>) -> Self {
        Self {
            config,
            engine,
            started_at: Utc::now(),
        }
    }

    /// Seconds since the process started serving.
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}
