//! Entity registry: the live towers, enemies and projectiles

use serde::{Deserialize, Serialize};

use super::catalog::{EnemyKind, TowerKind};
use super::path::Point;

/// A placed defense tower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    pub x: f32,
    pub y: f32,
    pub kind: TowerKind,
    pub level: u32,
    /// Targeting range on the surface the tower was placed on
    pub range: f32,
    /// Time of the last shot (ms), `None` if it never fired
    pub last_shot: Option<u64>,
}

impl Tower {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether the cooldown has elapsed at `now`
    pub fn ready_to_fire(&self, now: u64, fire_interval_ms: u64) -> bool {
        match self.last_shot {
            None => true,
            Some(last) => now.saturating_sub(last) > fire_interval_ms,
        }
    }
}

/// An enemy walking the path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub kind: EnemyKind,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub value: u32,
    /// Index of the last waypoint reached; the enemy walks toward the next one
    pub path_index: usize,
}

impl Enemy {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A projectile flying toward the point its target occupied at fire time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub damage: i32,
    pub speed: f32,
    pub source: TowerKind,
}

impl Projectile {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn target(&self) -> Point {
        Point::new(self.target_x, self.target_y)
    }
}

/// All simulated entities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRegistry {
    pub towers: Vec<Tower>,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.towers.clear();
        self.enemies.clear();
        self.projectiles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.towers.is_empty() && self.enemies.is_empty() && self.projectiles.is_empty()
    }
}
