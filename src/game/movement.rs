//! Enemy movement along the path

use super::path::{Point, Surface};
use super::registry::Enemy;

/// Outcome of moving a single enemy for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// Still on its way (possibly having just reached a waypoint)
    Walking,
    /// Standing on the final waypoint
    ReachedCore,
}

/// Movement system for enemies walking the waypoint list
pub struct MovementSystem;

impl MovementSystem {
    /// Advance an enemy by one tick along `path` (already scaled to `surface`).
    ///
    /// Arriving within `arrival_epsilon` of the next waypoint only bumps the
    /// waypoint index; the enemy moves again on the following tick.
    pub fn step_enemy(
        enemy: &mut Enemy,
        path: &[Point],
        surface: Surface,
        arrival_epsilon: f32,
    ) -> MoveResult {
        let last = path.len().saturating_sub(1);
        if enemy.path_index >= last {
            return MoveResult::ReachedCore;
        }

        let target = path[enemy.path_index + 1];
        let dx = target.x - enemy.x;
        let dy = target.y - enemy.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < arrival_epsilon * surface.scale_x() {
            enemy.path_index += 1;
        } else {
            enemy.x += (dx / distance) * enemy.speed * surface.scale_x();
            enemy.y += (dy / distance) * enemy.speed * surface.scale_y();
        }

        MoveResult::Walking
    }

    /// Check if a point lies within `radius` of `center`
    pub fn within(point: Point, center: Point, radius: f32) -> bool {
        let dx = point.x - center.x;
        let dy = point.y - center.y;
        dx * dx + dy * dy <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::EnemyKind;

    fn enemy_at(x: f32, y: f32, path_index: usize) -> Enemy {
        Enemy {
            x,
            y,
            kind: EnemyKind::Virus,
            health: 50,
            max_health: 50,
            speed: 2.0,
            value: 10,
            path_index,
        }
    }

    fn straight_path() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)]
    }

    #[test]
    fn moves_toward_next_waypoint_at_speed() {
        let mut enemy = enemy_at(0.0, 0.0, 0);
        let result = MovementSystem::step_enemy(&mut enemy, &straight_path(), Surface::default(), 5.0);

        assert_eq!(result, MoveResult::Walking);
        assert!((enemy.x - 2.0).abs() < 1e-5);
        assert_eq!(enemy.y, 0.0);
        assert_eq!(enemy.path_index, 0);
    }

    #[test]
    fn advances_index_within_arrival_epsilon() {
        let mut enemy = enemy_at(97.0, 0.0, 0);
        MovementSystem::step_enemy(&mut enemy, &straight_path(), Surface::default(), 5.0);

        assert_eq!(enemy.path_index, 1);
        assert_eq!(enemy.x, 97.0);
    }

    #[test]
    fn reports_core_at_last_waypoint() {
        let mut enemy = enemy_at(100.0, 100.0, 2);
        let result = MovementSystem::step_enemy(&mut enemy, &straight_path(), Surface::default(), 5.0);
        assert_eq!(result, MoveResult::ReachedCore);
    }

    #[test]
    fn scales_step_per_axis() {
        let path = vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)];
        let mut enemy = enemy_at(0.0, 0.0, 0);
        MovementSystem::step_enemy(&mut enemy, &path, Surface::new(800.0, 200.0), 5.0);
        assert!((enemy.y - 1.0).abs() < 1e-5);
    }
}
