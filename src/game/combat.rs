//! Combat system - targeting, projectiles, damage

use super::catalog::TowerStats;
use super::movement::MovementSystem;
use super::path::Point;
use super::registry::{Enemy, Projectile, Tower};

impl Projectile {
    /// Create a projectile from a tower aimed at a fixed point
    pub fn aimed_at(tower: &Tower, target: Point, speed: f32) -> Self {
        let stats = TowerStats::for_kind(tower.kind);
        Self {
            x: tower.x,
            y: tower.y,
            target_x: target.x,
            target_y: target.y,
            damage: stats.damage,
            speed,
            source: tower.kind,
        }
    }

    /// Move toward the target point. Returns `Arrived` without moving once the
    /// remaining distance is shorter than one tick of travel.
    pub fn advance(&mut self) -> ProjectileStep {
        let dx = self.target_x - self.x;
        let dy = self.target_y - self.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < self.speed {
            return ProjectileStep::Arrived;
        }

        self.x += (dx / distance) * self.speed;
        self.y += (dy / distance) * self.speed;
        ProjectileStep::InFlight
    }
}

/// Result of advancing a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileStep {
    InFlight,
    Arrived,
}

/// An enemy destroyed by a resolved hit
#[derive(Debug, Clone)]
pub struct Kill {
    pub enemy: Enemy,
}

/// Combat system for targeting and damage resolution
pub struct CombatSystem;

impl CombatSystem {
    /// First enemy in iteration order within the tower's range, not the nearest
    pub fn select_target<'a>(tower: &Tower, enemies: &'a [Enemy]) -> Option<&'a Enemy> {
        enemies
            .iter()
            .find(|enemy| MovementSystem::within(enemy.position(), tower.position(), tower.range))
    }

    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_health: i32, damage: i32) -> (i32, bool) {
        let new_health = current_health - damage;
        (new_health, new_health <= 0)
    }

    /// Damage every enemy strictly within `hit_radius` of the projectile's
    /// target point and remove the ones that die. Enemies that moved away or
    /// were already destroyed are simply missed.
    pub fn resolve_hit(projectile: &Projectile, enemies: &mut Vec<Enemy>, hit_radius: f32) -> Vec<Kill> {
        let target = projectile.target();
        let mut kills = Vec::new();

        enemies.retain_mut(|enemy| {
            if enemy.position().distance_to(target) >= hit_radius {
                return true;
            }

            let (new_health, dead) = Self::apply_damage(enemy.health, projectile.damage);
            enemy.health = new_health;
            if dead {
                kills.push(Kill {
                    enemy: enemy.clone(),
                });
            }
            !dead
        });

        kills
    }
}
