//! Tower and enemy catalogs plus the numeric tunables of the simulation

use serde::{Deserialize, Serialize};

/// Tower types available to the defender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Fast firing, affordable basic defense
    Laser,
    /// Heavy damage, short reach
    Plasma,
    /// Long range, expensive
    Quantum,
}

impl TowerKind {
    pub const ALL: [TowerKind; 3] = [TowerKind::Laser, TowerKind::Plasma, TowerKind::Quantum];

    /// The cheapest tower in the catalog
    pub fn cheapest() -> Self {
        Self::ALL
            .into_iter()
            .min_by_key(|kind| TowerStats::for_kind(*kind).cost)
            .unwrap_or(TowerKind::Laser)
    }
}

impl Default for TowerKind {
    fn default() -> Self {
        Self::Laser
    }
}

/// Enemy types spawned by waves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Virus,
    Malware,
    Trojan,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Virus, EnemyKind::Malware, EnemyKind::Trojan];
}

/// Tower stats per tower type
#[derive(Debug, Clone, Copy)]
pub struct TowerStats {
    /// Display name used in activity entries
    pub name: &'static str,
    /// Damage per projectile
    pub damage: i32,
    /// Targeting range in base (800x400) units
    pub range: f32,
    /// Credit cost
    pub cost: u32,
    /// Minimum time between shots (milliseconds)
    pub fire_interval_ms: u64,
}

impl TowerStats {
    pub fn for_kind(kind: TowerKind) -> Self {
        match kind {
            TowerKind::Laser => Self {
                name: "Laser Node",
                damage: 25,
                range: 80.0,
                cost: 50,
                fire_interval_ms: 500,
            },
            TowerKind::Plasma => Self {
                name: "Plasma Core",
                damage: 45,
                range: 60.0,
                cost: 100,
                fire_interval_ms: 500,
            },
            TowerKind::Quantum => Self {
                name: "Quantum Gate",
                damage: 80,
                range: 100.0,
                cost: 200,
                fire_interval_ms: 500,
            },
        }
    }
}

/// Enemy stats per enemy type
#[derive(Debug, Clone, Copy)]
pub struct EnemyStats {
    /// Health at wave 1
    pub base_health: i32,
    /// Movement per tick in base units
    pub speed: f32,
    /// Credits awarded on destruction
    pub value: u32,
    /// Visual radius, for renderers
    pub size: f32,
}

impl EnemyStats {
    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Virus => Self {
                base_health: 50,
                speed: 2.0,
                value: 10,
                size: 8.0,
            },
            EnemyKind::Malware => Self {
                base_health: 100,
                speed: 1.5,
                value: 20,
                size: 10.0,
            },
            EnemyKind::Trojan => Self {
                base_health: 200,
                speed: 1.0,
                value: 40,
                size: 12.0,
            },
        }
    }
}

/// Numeric tunables of the simulation.
///
/// Distances are expressed in base surface units and scaled by the active
/// surface at use sites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    /// Minimum time between two spawns (milliseconds)
    pub spawn_interval_ms: u64,
    /// Wave N spawns `N * enemies_per_wave` enemies
    pub enemies_per_wave: u32,
    /// Extra enemy health per wave after the first
    pub health_growth: i32,
    /// Credits granted when a wave completes
    pub wave_bonus: u32,
    /// Towers may not be placed closer than this to a waypoint
    pub path_clearance: f32,
    /// Towers may not be placed closer than this to each other
    pub tower_separation: f32,
    /// Projectile splash radius around its target point
    pub hit_radius: f32,
    /// Distance at which an enemy counts as having reached a waypoint
    pub arrival_epsilon: f32,
    /// Projectile travel per tick
    pub projectile_speed: f32,
    pub starting_health: u32,
    pub starting_credits: u32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 1000,
            enemies_per_wave: 5,
            health_growth: 10,
            wave_bonus: 50,
            path_clearance: 30.0,
            tower_separation: 40.0,
            hit_radius: 20.0,
            arrival_epsilon: 5.0,
            projectile_speed: 8.0,
            starting_health: 100,
            starting_credits: 150,
        }
    }
}

impl Tunables {
    /// Spawn quota for a wave
    pub fn wave_quota(&self, wave: u32) -> u32 {
        wave.saturating_mul(self.enemies_per_wave)
    }

    /// Health of a freshly spawned enemy in the given wave
    pub fn enemy_health(&self, kind: EnemyKind, wave: u32) -> i32 {
        let growth = wave.saturating_sub(1) as i32 * self.health_growth;
        EnemyStats::for_kind(kind).base_health + growth
    }
}
