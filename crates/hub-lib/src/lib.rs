// ============================
// crates/hub-lib/src/lib.rs
// ============================
//! Core hub functionality for the Palaver presence/relay server.
//!
//! Rooms, random matchmaking, chat, and WebRTC signaling relay over a
//! WebSocket transport. All state is volatile and intentionally lost on
//! restart.

pub mod config;
pub mod error;
pub mod hub;
pub mod matchmaking;
pub mod membership;
pub mod metrics;
pub mod registry;
pub mod relay;
pub mod rooms;
pub mod validation;
pub mod ws_router;

use crate::config::Settings;
use crate::hub::Hub;

/// Application state shared across all handlers
pub struct AppState {
    /// The state-owning coordination core
    pub hub: Hub,
    /// Settings the server was started with
    pub settings: Settings,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> Self {
        Self {
            hub: Hub::new(),
            settings,
        }
    }
}
