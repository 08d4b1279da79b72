//! Integration test harness.
//!
//! Each module exercises the gateway through a real listening server and
//! `tokio-tungstenite` WebSocket clients.

mod helpers;

mod health_test;
mod ws_auth_test;
mod ws_chat_test;
mod ws_presence_test;
mod ws_receipts_test;
mod ws_typing_test;
