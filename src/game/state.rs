//! Game-wide counters and status flags

use serde::{Deserialize, Serialize};

use super::catalog::Tunables;

/// Economy, progress and status of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Core integrity (0-100)
    pub health: u32,
    pub credits: u32,
    pub wave: u32,
    pub score: u64,
    pub is_playing: bool,
    pub is_paused: bool,
    /// Terminal until an explicit reset
    pub game_over: bool,
}

impl GameState {
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            health: tunables.starting_health,
            credits: tunables.starting_credits,
            wave: 1,
            score: 0,
            is_playing: false,
            is_paused: false,
            game_over: false,
        }
    }

    /// Whether a tick should advance the simulation
    pub fn is_running(&self) -> bool {
        self.is_playing && !self.is_paused && !self.game_over
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&Tunables::default())
    }
}

/// Spawn bookkeeping for the current wave
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveCounters {
    /// Time of the last spawn (ms)
    pub last_spawn_at: u64,
    pub spawned_this_wave: u32,
}
