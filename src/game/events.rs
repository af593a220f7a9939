//! Discrete events emitted by the simulation for sound and activity feeds

use serde::{Deserialize, Serialize};

use super::catalog::{EnemyKind, TowerKind};

/// Something noteworthy that happened during a command or a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Defense system activated
    Started,

    /// Run reset with a fresh path
    Reset,

    /// A tower was deployed
    TowerPlaced {
        kind: TowerKind,
        x: f32,
        y: f32,
    },

    /// A tower fired a projectile
    ShotFired {
        kind: TowerKind,
        x: f32,
        y: f32,
        target_x: f32,
        target_y: f32,
    },

    /// An enemy was destroyed by a projectile
    EnemyDestroyed {
        kind: EnemyKind,
        value: u32,
        x: f32,
        y: f32,
    },

    /// A wave was cleared
    WaveComplete {
        /// The wave that was just completed
        wave: u32,
        bonus: u32,
    },

    /// An enemy reached the core
    GameOver {
        score: u64,
    },
}
