//! Game simulation modules

pub mod catalog;
pub mod combat;
pub mod engine;
pub mod events;
pub mod movement;
pub mod path;
pub mod placement;
pub mod registry;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod tests;

pub use catalog::{EnemyKind, EnemyStats, TowerKind, TowerStats, Tunables};
pub use engine::{EngineConfig, SimulationEngine};
pub use events::GameEvent;
pub use path::{Path, PathError, PathPattern, Point, Surface};
pub use placement::{PlacementError, PlacementValidator};
pub use registry::{Enemy, EntityRegistry, Projectile, Tower};
pub use snapshot::GameSnapshot;
pub use state::{GameState, WaveCounters};
