//! Simulation engine - advances a run one tick at a time
//!
//! The engine is a pure state transition over the entity registry and the
//! game state. It never blocks and never fails; I/O lives in the session
//! driver around it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::catalog::{EnemyKind, EnemyStats, TowerKind, TowerStats, Tunables};
use super::combat::{CombatSystem, ProjectileStep};
use super::events::GameEvent;
use super::movement::{MoveResult, MovementSystem};
use super::path::{Path, Point, Surface};
use super::placement::{PlacementError, PlacementValidator};
use super::registry::{Enemy, EntityRegistry, Projectile, Tower};
use super::snapshot::GameSnapshot;
use super::state::{GameState, WaveCounters};

/// Configuration for a new engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// RNG seed for spawn rolls and path selection
    pub seed: u64,
    pub tunables: Tunables,
    pub surface: Surface,
    /// Fixed path; a random built-in pattern is used when `None`
    pub path: Option<Path>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: rand::random(),
            tunables: Tunables::default(),
            surface: Surface::default(),
            path: None,
        }
    }
}

/// The simulation engine. Owns the entity registry and all run state.
pub struct SimulationEngine {
    tunables: Tunables,
    surface: Surface,
    path: Path,
    scaled_path: Vec<Point>,
    registry: EntityRegistry,
    state: GameState,
    waves: WaveCounters,
    rng: ChaCha8Rng,
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let path = config.path.unwrap_or_else(|| Path::random(&mut rng));
        let scaled_path = path.scaled(config.surface);

        Self {
            state: GameState::new(&config.tunables),
            tunables: config.tunables,
            surface: config.surface,
            path,
            scaled_path,
            registry: EntityRegistry::new(),
            waves: WaveCounters::default(),
            rng,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn waves(&self) -> WaveCounters {
        self.waves
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path waypoints laid out on the current surface
    pub fn scaled_path(&self) -> &[Point] {
        &self.scaled_path
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    #[cfg(test)]
    pub(crate) fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[cfg(test)]
    pub(crate) fn waves_mut(&mut self) -> &mut WaveCounters {
        &mut self.waves
    }

    /// Change the rendering surface. Existing entities keep their coordinates.
    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
        self.scaled_path = self.path.scaled(surface);
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Activate the defense system. Ignored once the game is over.
    pub fn start(&mut self) -> Option<GameEvent> {
        if self.state.game_over || self.state.is_playing {
            return None;
        }
        self.state.is_playing = true;
        info!(wave = self.state.wave, "Defense system activated");
        Some(GameEvent::Started)
    }

    pub fn pause(&mut self) {
        self.state.is_paused = true;
    }

    pub fn resume(&mut self) {
        self.state.is_paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.state.is_paused = !self.state.is_paused;
    }

    /// Start over: fresh state, empty registry and a new random path
    pub fn reset(&mut self) -> GameEvent {
        self.path = Path::random(&mut self.rng);
        self.scaled_path = self.path.scaled(self.surface);
        self.state = GameState::new(&self.tunables);
        self.registry.clear();
        self.waves = WaveCounters::default();
        info!("Defense system reset - new path generated");
        GameEvent::Reset
    }

    /// Place a tower at `(x, y)` on the current surface
    pub fn place_tower(&mut self, x: f32, y: f32, kind: TowerKind) -> Result<(Tower, GameEvent), PlacementError> {
        if !self.state.is_running() {
            return Err(PlacementError::Inactive);
        }

        let validator = PlacementValidator::new(&self.tunables, self.surface, &self.scaled_path);
        let tower = validator.place(
            Point::new(x, y),
            kind,
            &mut self.state.credits,
            &mut self.registry.towers,
        )?;

        info!(
            kind = TowerStats::for_kind(kind).name,
            x,
            y,
            credits = self.state.credits,
            "Tower deployed"
        );

        let event = GameEvent::TowerPlaced { kind, x, y };
        Ok((tower, event))
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            seq: 0,
            state: self.state.clone(),
            registry: self.registry.clone(),
            waves: self.waves,
            path: self.path.clone(),
        }
    }

    /// Replace the registry wholesale with a published snapshot.
    ///
    /// Local `is_playing`/`is_paused` flags are kept; progress, economy and
    /// the terminal flag come from the snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &GameSnapshot) {
        self.registry = snapshot.registry.clone();
        self.waves = snapshot.waves;
        self.path = snapshot.path.clone();
        self.scaled_path = self.path.scaled(self.surface);

        self.state.health = snapshot.state.health;
        self.state.credits = snapshot.state.credits;
        self.state.wave = snapshot.state.wave;
        self.state.score = snapshot.state.score;
        self.state.game_over = snapshot.state.game_over;
        if self.state.game_over {
            self.state.is_playing = false;
        }

        debug!(
            seq = snapshot.seq,
            wave = snapshot.state.wave,
            towers = snapshot.registry.towers.len(),
            enemies = snapshot.registry.enemies.len(),
            "Applied snapshot"
        );
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation to `now` (Unix epoch milliseconds, as given by `SimClock`).
    ///
    /// Phases run in a fixed order: spawn, move, fire, resolve, wave check.
    pub fn tick(&mut self, now: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if !self.state.is_running() {
            return events;
        }

        self.spawn_enemies(now);

        if self.update_movement() {
            self.trigger_game_over(&mut events);
            return events;
        }

        self.fire_towers(now, &mut events);
        self.update_projectiles(&mut events);
        self.check_wave_complete(&mut events);

        events
    }

    fn spawn_enemies(&mut self, now: u64) {
        let quota = self.tunables.wave_quota(self.state.wave);
        if now.saturating_sub(self.waves.last_spawn_at) <= self.tunables.spawn_interval_ms
            || self.waves.spawned_this_wave >= quota
        {
            return;
        }

        let kind = EnemyKind::ALL[self.rng.gen_range(0..EnemyKind::ALL.len())];
        let stats = EnemyStats::for_kind(kind);
        let health = self.tunables.enemy_health(kind, self.state.wave);
        let start = self.scaled_path[0];

        self.registry.enemies.push(Enemy {
            x: start.x,
            y: start.y,
            kind,
            health,
            max_health: health,
            speed: stats.speed,
            value: stats.value,
            path_index: 0,
        });

        self.waves.last_spawn_at = now;
        self.waves.spawned_this_wave += 1;

        debug!(
            ?kind,
            wave = self.state.wave,
            spawned = self.waves.spawned_this_wave,
            quota,
            "Enemy spawned"
        );
    }

    /// Move every enemy. Returns true if any enemy reached the core.
    fn update_movement(&mut self) -> bool {
        let path = &self.scaled_path;
        let surface = self.surface;
        let epsilon = self.tunables.arrival_epsilon;
        let mut breached = false;

        self.registry.enemies.retain_mut(|enemy| {
            match MovementSystem::step_enemy(enemy, path, surface, epsilon) {
                MoveResult::Walking => true,
                MoveResult::ReachedCore => {
                    breached = true;
                    false
                }
            }
        });

        breached
    }

    fn fire_towers(&mut self, now: u64, events: &mut Vec<GameEvent>) {
        let speed = self.tunables.projectile_speed * self.surface.scale_x();
        let mut fired = Vec::new();

        for tower in self.registry.towers.iter_mut() {
            let stats = TowerStats::for_kind(tower.kind);
            if !tower.ready_to_fire(now, stats.fire_interval_ms) {
                continue;
            }

            let Some(target) = CombatSystem::select_target(tower, &self.registry.enemies) else {
                continue;
            };

            let projectile = Projectile::aimed_at(tower, target.position(), speed);
            events.push(GameEvent::ShotFired {
                kind: tower.kind,
                x: tower.x,
                y: tower.y,
                target_x: projectile.target_x,
                target_y: projectile.target_y,
            });
            tower.last_shot = Some(now);
            fired.push(projectile);
        }

        self.registry.projectiles.extend(fired);
    }

    fn update_projectiles(&mut self, events: &mut Vec<GameEvent>) {
        let hit_radius = self.tunables.hit_radius * self.surface.scale_x();
        let enemies = &mut self.registry.enemies;
        let state = &mut self.state;

        self.registry.projectiles.retain_mut(|projectile| {
            if projectile.advance() == ProjectileStep::InFlight {
                return true;
            }

            for kill in CombatSystem::resolve_hit(projectile, enemies, hit_radius) {
                let enemy = kill.enemy;
                state.credits += enemy.value;
                state.score += u64::from(enemy.value) * 10;
                events.push(GameEvent::EnemyDestroyed {
                    kind: enemy.kind,
                    value: enemy.value,
                    x: enemy.x,
                    y: enemy.y,
                });
            }
            false
        });
    }

    fn check_wave_complete(&mut self, events: &mut Vec<GameEvent>) {
        let quota = self.tunables.wave_quota(self.state.wave);
        if !self.registry.enemies.is_empty() || self.waves.spawned_this_wave < quota {
            return;
        }

        let completed = self.state.wave;
        self.state.wave += 1;
        self.state.credits += self.tunables.wave_bonus;
        self.waves.spawned_this_wave = 0;

        info!(
            wave = completed,
            credits = self.state.credits,
            score = self.state.score,
            "Wave completed"
        );

        events.push(GameEvent::WaveComplete {
            wave: completed,
            bonus: self.tunables.wave_bonus,
        });
    }

    fn trigger_game_over(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.game_over {
            return;
        }
        self.state.game_over = true;
        self.state.is_playing = false;

        info!(
            score = self.state.score,
            wave = self.state.wave,
            "Nexus compromised - game over"
        );

        events.push(GameEvent::GameOver {
            score: self.state.score,
        });
    }
}
