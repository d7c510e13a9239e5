//! Room configuration.

use serde::{Deserialize, Serialize};

/// Tunables shared by both roles.
///
/// Cadences are counted in simulation ticks, so at the default 60 Hz a
/// broadcast every 30 ticks is twice a second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Arena size; placeholders are put at its centre.
    pub arena_width: f64,
    pub arena_height: f64,

    /// Host: ticks between periodic snapshots. 0 disables them.
    pub broadcast_every_ticks: u64,

    /// Client: ticks between `requestState` retries while the directory is
    /// still empty. 0 disables retries.
    pub state_request_every_ticks: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            arena_width: 800.0,
            arena_height: 600.0,
            broadcast_every_ticks: 30,
            state_request_every_ticks: 60,
        }
    }
}

impl RoomConfig {
    pub fn with_arena(mut self, width: f64, height: f64) -> Self {
        self.arena_width = width;
        self.arena_height = height;
        self
    }

    pub fn with_broadcast_every(mut self, ticks: u64) -> Self {
        self.broadcast_every_ticks = ticks;
        self
    }

    pub fn with_state_request_every(mut self, ticks: u64) -> Self {
        self.state_request_every_ticks = ticks;
        self
    }

    /// Where placeholder players are put.
    pub fn arena_centre(&self) -> (f64, f64) {
        (self.arena_width / 2.0, self.arena_height / 2.0)
    }
}
