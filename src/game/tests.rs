//! Tests for the simulation engine: spawning, movement, combat, waves, economy.

use crate::game::catalog::{EnemyKind, EnemyStats, TowerKind, Tunables};
use crate::game::engine::{EngineConfig, SimulationEngine};
use crate::game::events::GameEvent;
use crate::game::path::{Path, Point, Surface};
use crate::game::placement::PlacementError;
use crate::game::registry::{Enemy, Tower};

fn straight_path() -> Path {
    Path::new(vec![
        Point::new(0.0, 200.0),
        Point::new(400.0, 200.0),
        Point::new(750.0, 200.0),
    ])
    .unwrap()
}

fn engine() -> SimulationEngine {
    SimulationEngine::new(EngineConfig {
        seed: 42,
        tunables: Tunables::default(),
        surface: Surface::default(),
        path: Some(straight_path()),
    })
}

fn running_engine() -> SimulationEngine {
    let mut engine = engine();
    engine.start();
    engine
}

fn enemy_at(x: f32, y: f32, health: i32, path_index: usize) -> Enemy {
    let stats = EnemyStats::for_kind(EnemyKind::Virus);
    Enemy {
        x,
        y,
        kind: EnemyKind::Virus,
        health,
        max_health: health,
        speed: stats.speed,
        value: stats.value,
        path_index,
    }
}

fn laser_at(x: f32, y: f32) -> Tower {
    Tower {
        x,
        y,
        kind: TowerKind::Laser,
        level: 1,
        range: 80.0,
        last_shot: None,
    }
}

// ---- Economy & placement ----

#[test]
fn test_fresh_run_places_cheapest_tower() {
    let mut engine = running_engine();
    assert_eq!(engine.state().health, 100);
    assert_eq!(engine.state().credits, 150);
    assert_eq!(engine.state().wave, 1);

    let (tower, event) = engine.place_tower(100.0, 300.0, TowerKind::cheapest()).unwrap();

    assert_eq!(engine.state().credits, 100);
    assert_eq!(engine.registry().towers, vec![tower]);
    assert_eq!(
        event,
        GameEvent::TowerPlaced {
            kind: TowerKind::Laser,
            x: 100.0,
            y: 300.0
        }
    );
}

#[test]
fn test_placement_with_insufficient_funds_leaves_no_tower() {
    let mut engine = running_engine();
    engine.state_mut().credits = 40;

    let result = engine.place_tower(100.0, 300.0, TowerKind::Laser);

    assert!(matches!(result, Err(PlacementError::InsufficientCredits { cost: 50, available: 40 })));
    assert!(engine.registry().towers.is_empty());
    assert_eq!(engine.state().credits, 40);
}

#[test]
fn test_placement_requires_running_game() {
    let mut engine = engine();
    assert_eq!(
        engine.place_tower(100.0, 300.0, TowerKind::Laser),
        Err(PlacementError::Inactive)
    );

    engine.start();
    engine.pause();
    assert_eq!(
        engine.place_tower(100.0, 300.0, TowerKind::Laser),
        Err(PlacementError::Inactive)
    );
}

#[test]
fn test_placement_on_path_fails_regardless_of_credits() {
    let mut engine = running_engine();
    engine.state_mut().credits = 100_000;

    let result = engine.place_tower(410.0, 210.0, TowerKind::Quantum);

    assert_eq!(result, Err(PlacementError::OnPath));
    assert_eq!(engine.state().credits, 100_000);
}

// ---- Spawning ----

#[test]
fn test_spawn_respects_interval() {
    let mut engine = running_engine();

    engine.tick(0);
    assert!(engine.registry().enemies.is_empty());

    engine.tick(1001);
    assert_eq!(engine.registry().enemies.len(), 1);
    assert_eq!(engine.waves().spawned_this_wave, 1);

    engine.tick(1500);
    assert_eq!(engine.registry().enemies.len(), 1);

    engine.tick(2002);
    assert_eq!(engine.registry().enemies.len(), 2);
}

#[test]
fn test_spawned_enemy_health_scales_with_wave() {
    let mut engine = running_engine();
    engine.state_mut().wave = 3;

    engine.tick(1001);

    let enemy = &engine.registry().enemies[0];
    let base = EnemyStats::for_kind(enemy.kind).base_health;
    assert_eq!(enemy.health, base + 20);
    assert_eq!(enemy.max_health, enemy.health);
}

#[test]
fn test_enemy_count_grows_by_at_most_one_per_tick() {
    let mut engine = running_engine();

    let mut before = 0;
    for i in 0..2_000u64 {
        engine.tick(i * 16);
        let after = engine.registry().enemies.len();
        assert!(after <= before + 1, "tick {i}: {before} -> {after}");
        before = after;
    }
}

#[test]
fn test_spawn_stops_at_wave_quota() {
    let mut engine = running_engine();
    engine.waves_mut().spawned_this_wave = 5;
    engine.registry_mut().enemies.push(enemy_at(100.0, 200.0, 50, 0));

    engine.tick(5_000);

    assert_eq!(engine.registry().enemies.len(), 1);
    assert_eq!(engine.waves().spawned_this_wave, 5);
}

#[test]
fn test_same_seed_spawns_same_kinds() {
    let kinds = |seed: u64| {
        let mut engine = SimulationEngine::new(EngineConfig {
            seed,
            tunables: Tunables::default(),
            surface: Surface::default(),
            path: Some(straight_path()),
        });
        engine.start();
        for i in 1..=4u64 {
            engine.tick(i * 1001);
        }
        engine
            .registry()
            .enemies
            .iter()
            .map(|e| e.kind)
            .collect::<Vec<_>>()
    };

    assert_eq!(kinds(9), kinds(9));
}

// ---- Terminal loss ----

#[test]
fn test_enemy_at_core_ends_game_at_full_health() {
    let mut engine = running_engine();
    engine.registry_mut().enemies.push(enemy_at(750.0, 200.0, 50, 2));

    let events = engine.tick(10);

    assert!(engine.state().game_over);
    assert!(!engine.state().is_playing);
    assert_eq!(engine.state().health, 100);
    assert!(engine.registry().enemies.is_empty());
    assert_eq!(events, vec![GameEvent::GameOver { score: 0 }]);
}

#[test]
fn test_game_over_is_terminal() {
    let mut engine = running_engine();
    engine.registry_mut().enemies.push(enemy_at(750.0, 200.0, 50, 2));
    engine.tick(10);

    engine.registry_mut().enemies.push(enemy_at(100.0, 200.0, 50, 0));
    let events = engine.tick(5_000);

    assert!(events.is_empty());
    assert_eq!(engine.registry().enemies[0].x, 100.0);
    assert_eq!(engine.start(), None);
    assert!(engine.state().game_over);
}

#[test]
fn test_enemy_walks_whole_path_then_breaches() {
    let path = Path::new(vec![Point::new(0.0, 200.0), Point::new(20.0, 200.0)]).unwrap();
    let mut engine = SimulationEngine::new(EngineConfig {
        seed: 1,
        tunables: Tunables::default(),
        surface: Surface::default(),
        path: Some(path),
    });
    engine.start();
    engine.registry_mut().enemies.push(enemy_at(0.0, 200.0, 50, 0));

    let mut now = 0;
    while !engine.state().game_over && now < 100 {
        engine.tick(now);
        now += 1;
    }

    assert!(engine.state().game_over);
}

// ---- Combat ----

#[test]
fn test_exact_lethal_damage_rewards_once() {
    let mut engine = running_engine();
    engine.registry_mut().towers.push(laser_at(400.0, 250.0));
    let mut target = enemy_at(400.0, 200.0, 25, 1);
    target.speed = 0.0;
    engine.registry_mut().enemies.push(target);

    let mut destroyed = 0;
    for now in 10..40u64 {
        destroyed += engine
            .tick(now)
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyDestroyed { .. }))
            .count();
    }

    assert_eq!(destroyed, 1);
    assert!(engine.registry().enemies.is_empty());
    assert!(engine.registry().projectiles.is_empty());
    assert_eq!(engine.state().credits, 160);
    assert_eq!(engine.state().score, 100);
}

#[test]
fn test_projectile_misses_enemy_that_moved_away() {
    let mut engine = running_engine();
    engine.registry_mut().towers.push(laser_at(400.0, 250.0));
    let mut runner = enemy_at(400.0, 200.0, 25, 1);
    runner.speed = 10.0;
    engine.registry_mut().enemies.push(runner);

    for now in 10..20u64 {
        engine.tick(now);
    }

    assert!(engine.registry().projectiles.is_empty());
    assert_eq!(engine.registry().enemies.len(), 1);
    assert_eq!(engine.registry().enemies[0].health, 25);
    assert_eq!(engine.state().credits, 150);
}

#[test]
fn test_tower_respects_fire_interval() {
    let mut engine = running_engine();
    engine.registry_mut().towers.push(laser_at(400.0, 250.0));
    let mut tank = enemy_at(400.0, 200.0, 10_000, 1);
    tank.speed = 0.0;
    engine.registry_mut().enemies.push(tank);

    let shots = |events: Vec<GameEvent>| {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::ShotFired { .. }))
            .count()
    };

    assert_eq!(shots(engine.tick(100)), 1);
    assert_eq!(shots(engine.tick(600)), 0);
    assert_eq!(shots(engine.tick(601)), 1);
    assert_eq!(engine.registry().towers[0].last_shot, Some(601));
}

#[test]
fn test_enemy_count_drops_only_by_lethal_hits() {
    let mut engine = running_engine();
    engine.registry_mut().towers.push(laser_at(200.0, 250.0));
    engine.registry_mut().towers.push(laser_at(600.0, 250.0));

    let mut before = 0;
    for i in 0..3_000u64 {
        let events = engine.tick(i * 16);
        if engine.state().game_over {
            break;
        }
        let kills = events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyDestroyed { .. }))
            .count();
        let after = engine.registry().enemies.len();
        assert!(after + kills <= before + 1, "tick {i}: {before} -> {after} with {kills} kills");
        assert!(before <= after + kills, "tick {i}: {before} -> {after} with {kills} kills");
        before = after;
    }
}

// ---- Waves ----

#[test]
fn test_wave_completes_when_quota_met_and_field_clear() {
    let mut engine = running_engine();
    engine.waves_mut().spawned_this_wave = 5;

    let events = engine.tick(100);

    assert_eq!(engine.state().wave, 2);
    assert_eq!(engine.state().credits, 200);
    assert_eq!(engine.waves().spawned_this_wave, 0);
    assert_eq!(events, vec![GameEvent::WaveComplete { wave: 1, bonus: 50 }]);
    assert_eq!(engine.tunables().wave_quota(engine.state().wave), 10);
}

#[test]
fn test_wave_does_not_complete_before_quota() {
    let mut engine = running_engine();
    engine.waves_mut().spawned_this_wave = 4;

    engine.tick(500);

    assert_eq!(engine.state().wave, 1);
}

#[test]
fn test_wave_does_not_complete_while_enemy_alive() {
    let mut engine = running_engine();
    engine.waves_mut().spawned_this_wave = 5;
    engine.registry_mut().enemies.push(enemy_at(100.0, 200.0, 50, 0));

    engine.tick(500);

    assert_eq!(engine.state().wave, 1);
    assert_eq!(engine.state().credits, 150);
}

// ---- Commands ----

#[test]
fn test_paused_engine_does_not_advance() {
    let mut engine = running_engine();
    engine.registry_mut().enemies.push(enemy_at(100.0, 200.0, 50, 0));
    engine.pause();

    assert!(engine.tick(5_000).is_empty());
    assert_eq!(engine.registry().enemies[0].x, 100.0);

    engine.resume();
    engine.tick(5_016);
    assert!(engine.registry().enemies[0].x > 100.0);
}

#[test]
fn test_reset_restores_fresh_run() {
    let mut engine = running_engine();
    engine.place_tower(100.0, 300.0, TowerKind::Laser).unwrap();
    engine.registry_mut().enemies.push(enemy_at(750.0, 200.0, 50, 2));
    engine.tick(10);
    assert!(engine.state().game_over);

    let event = engine.reset();

    assert_eq!(event, GameEvent::Reset);
    assert_eq!(engine.state().health, 100);
    assert_eq!(engine.state().credits, 150);
    assert_eq!(engine.state().wave, 1);
    assert!(!engine.state().game_over);
    assert!(!engine.state().is_playing);
    assert!(engine.registry().is_empty());
    assert_eq!(engine.waves().spawned_this_wave, 0);
    assert!(engine.start().is_some());
}

// ---- Snapshots ----

#[test]
fn test_apply_snapshot_replaces_registry_but_keeps_local_flags() {
    let mut source = running_engine();
    source.place_tower(100.0, 300.0, TowerKind::Laser).unwrap();
    source.state_mut().wave = 3;
    let snapshot = source.snapshot();

    let mut target = engine();
    target.registry_mut().enemies.push(enemy_at(100.0, 200.0, 50, 0));
    target.apply_snapshot(&snapshot);

    assert_eq!(target.registry(), source.registry());
    assert_eq!(target.state().wave, 3);
    assert_eq!(target.state().credits, 100);
    assert!(!target.state().is_playing);
    assert_eq!(target.path(), source.path());
}
