//! # parlor-gateway
//!
//! HTTP surface for the Parlor chat gateway built on Axum.
//!
//! Provides the WebSocket upgrade endpoint and socket pump, health
//! endpoints, error mapping, and the router.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
