//! Snapshots of a run, as published to the shared room store

use serde::{Deserialize, Serialize};

use super::path::Path;
use super::registry::EntityRegistry;
use super::state::{GameState, WaveCounters};

/// Full copy of the entity registry and game state at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Publish sequence within a room; 0 for snapshots that were never published
    #[serde(default)]
    pub seq: u64,
    pub state: GameState,
    pub registry: EntityRegistry,
    pub waves: WaveCounters,
    pub path: Path,
}

impl GameSnapshot {
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    pub fn tower_count(&self) -> usize {
        self.registry.towers.len()
    }
}
