//! Tests for the simulation engine, spatial index, unit controller and
//! selection.

use glam::DVec3;
use hecs::Entity;

use phalanx_agent::profiles::{AgentProfile, UnitProfile};
use phalanx_core::commands::PlayerCommand;
use phalanx_core::components::{Health, Selector};
use phalanx_core::enums::*;
use phalanx_core::events::SimEvent;
use phalanx_core::types::{flatten, Position, TeamId};

use crate::components::{SoldierAgent, UnitController};
use crate::engine::{SimConfig, SimulationEngine};
use crate::error::SimError;
use crate::spatial::{Occupant, OccupantKind, SpatialIndex};
use crate::unit::entity_id;

const BLUE: TeamId = TeamId(1);
const RED: TeamId = TeamId(2);

fn engine_with(unit: UnitProfile) -> SimulationEngine {
    SimulationEngine::new(SimConfig {
        unit,
        ..Default::default()
    })
}

fn small_unit(soldiers: usize) -> UnitProfile {
    UnitProfile {
        soldiers,
        ..Default::default()
    }
}

fn controller(engine: &SimulationEngine, unit: Entity) -> UnitController {
    engine
        .world()
        .get::<&UnitController>(unit)
        .map(|c| (*c).clone())
        .expect("unit should exist")
}

fn soldier_states(engine: &SimulationEngine, unit: Entity) -> Vec<SoldierState> {
    controller(engine, unit)
        .roster
        .iter()
        .map(|&s| engine.world().get::<&SoldierAgent>(s).map(|a| a.state).unwrap())
        .collect()
}

/// Idle-count bounds, Idle ⇔ all idle, and counters matching a full rescan.
fn assert_unit_invariants(engine: &SimulationEngine) {
    for (_, c) in engine.world().query::<&UnitController>().iter() {
        let states: Vec<SoldierState> = c
            .roster
            .iter()
            .map(|&s| engine.world().get::<&SoldierAgent>(s).map(|a| a.state).unwrap())
            .collect();
        let idle = states.iter().filter(|s| **s == SoldierState::Idle).count();
        let attacking = states.iter().filter(|s| **s == SoldierState::Attacking).count();
        assert!(c.idle_count <= c.roster.len());
        assert_eq!(c.idle_count, idle, "idle counter drifted");
        assert_eq!(c.engaged_count, attacking, "engaged counter drifted");
        if !c.roster.is_empty() {
            assert_eq!(
                c.state == UnitState::Idle,
                c.idle_count == c.roster.len(),
                "state {:?} with {}/{} idle",
                c.state,
                c.idle_count,
                c.roster.len()
            );
        }
    }
}

fn kill_soldier(engine: &mut SimulationEngine, soldier: Entity) {
    if let Ok(mut health) = engine.world_mut().get::<&mut Health>(soldier) {
        health.current = 0.0;
    }
}

// ---- Spatial index ----

#[test]
fn test_spatial_query_radius() {
    let mut world = hecs::World::new();
    let a = world.spawn(());
    let b = world.spawn(());
    let mut index = SpatialIndex::new(4.0);
    index.insert(Occupant {
        entity: a,
        position: DVec3::new(1.0, 0.0, 1.0),
        kind: OccupantKind::Obstacle,
    });
    index.insert(Occupant {
        entity: b,
        position: DVec3::new(-9.0, 0.0, 0.5),
        kind: OccupantKind::Obstacle,
    });
    assert_eq!(index.len(), 2);

    let near = index.query_neighbors(DVec3::ZERO, 2.0);
    assert_eq!(near.len(), 1);
    assert_eq!(near[0].entity, a);

    let wide = index.query_neighbors(DVec3::ZERO, 10.0);
    assert_eq!(wide.len(), 2);

    index.clear();
    assert!(index.is_empty());
    assert!(index.query_neighbors(DVec3::ZERO, 10.0).is_empty());
}

#[test]
fn test_spatial_clear_drops_stale_cells() {
    let mut world = hecs::World::new();
    let mut index = SpatialIndex::new(4.0);
    // A soldier walking across ten cells, one rebuild per cell.
    for step in 0..10 {
        let entity = world.spawn(());
        index.clear();
        index.insert(Occupant {
            entity,
            position: DVec3::new(step as f64 * 4.0 + 1.0, 0.0, 1.0),
            kind: OccupantKind::Obstacle,
        });
        assert!(index.cells.len() <= 2, "{} cells kept", index.cells.len());
    }
    index.clear();
    index.clear();
    assert!(index.cells.is_empty());
}

#[test]
fn test_spatial_ignores_height() {
    let mut world = hecs::World::new();
    let a = world.spawn(());
    let mut index = SpatialIndex::default();
    index.insert(Occupant {
        entity: a,
        position: DVec3::new(0.5, 30.0, 0.0),
        kind: OccupantKind::Obstacle,
    });
    assert_eq!(index.query_neighbors(DVec3::ZERO, 1.0).len(), 1);
}

#[test]
fn test_spatial_rebuild_from_world() {
    let mut engine = engine_with(small_unit(4));
    engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.spawn_obstacle(DVec3::new(3.0, 0.0, 3.0));
    let mut index = SpatialIndex::default();
    index.rebuild(engine.world());
    assert_eq!(index.len(), 5);
    let obstacles = index
        .query_neighbors(DVec3::new(3.0, 0.0, 3.0), 0.1)
        .into_iter()
        .filter(|o| o.kind == OccupantKind::Obstacle)
        .count();
    assert_eq!(obstacles, 1);
}

// ---- Spawning ----

#[test]
fn test_spawn_unit_in_formation() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::new(5.0, 0.0, 5.0)).unwrap();
    let c = controller(&engine, unit);
    assert_eq!(c.roster.len(), 12);
    assert_eq!(c.idle_count, 12);
    assert_eq!(c.state, UnitState::Idle);
    assert_eq!(c.team, BLUE);
    assert_eq!(c.enemy_team, RED);

    let bounds = c.bounds.expect("spawned unit has bounds");
    for &s in &c.roster {
        let pos = engine.world().get::<&Position>(s).unwrap().0;
        assert!(bounds.contains_ground(pos));
        let agent = engine.world().get::<&SoldierAgent>(s).unwrap();
        assert_eq!(agent.unit, unit);
        assert_eq!(agent.team, BLUE);
        assert!(agent.enemy.is_none());
    }
    assert!((c.bounds_centroid.x - 5.0).abs() < 1e-9);
    assert!((c.bounds_centroid.z - 5.0).abs() < 1e-9);
}

#[test]
fn test_spawn_rejects_bad_layouts() {
    let mut engine = engine_with(small_unit(0));
    assert_eq!(
        engine.spawn_team_unit(BLUE, RED, DVec3::ZERO),
        Err(SimError::EmptyRoster)
    );

    let mut engine = engine_with(UnitProfile {
        rows: 0,
        ..Default::default()
    });
    assert_eq!(
        engine.spawn_team_unit(BLUE, RED, DVec3::ZERO),
        Err(SimError::NoRows)
    );

    let mut engine = SimulationEngine::new(SimConfig::default());
    assert_eq!(
        engine.spawn_team_unit(BLUE, BLUE, DVec3::ZERO),
        Err(SimError::SameTeam(BLUE))
    );
    assert_eq!(
        engine.spawn_team_unit(TeamId(9), RED, DVec3::ZERO),
        Err(SimError::UnknownTeam(TeamId(9)))
    );
    assert_eq!(engine.remaining_units_to_place(BLUE), 5, "failed spawns cost nothing");
}

#[test]
fn test_placement_budget() {
    let mut engine = SimulationEngine::new(SimConfig {
        units_per_team: 2,
        unit: small_unit(1),
        ..Default::default()
    });
    assert_eq!(engine.remaining_units_to_place(BLUE), 2);
    engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.spawn_team_unit(BLUE, RED, DVec3::new(10.0, 0.0, 0.0)).unwrap();
    assert_eq!(engine.remaining_units_to_place(BLUE), 0);
    assert_eq!(
        engine.spawn_team_unit(BLUE, RED, DVec3::new(20.0, 0.0, 0.0)),
        Err(SimError::NoUnitsRemaining(BLUE))
    );
    assert_eq!(engine.remaining_units_to_place(RED), 2);

    let snap = engine.tick();
    let blue = snap.teams.iter().find(|t| t.id == BLUE).unwrap();
    assert_eq!(blue.remaining_units_to_place, 0);
    assert_eq!(blue.units_alive, 2);
}

#[test]
fn test_spawn_only_during_deployment() {
    let mut engine = engine_with(small_unit(1));
    engine.queue_command(PlayerCommand::Fight);
    engine.tick();
    assert_eq!(
        engine.spawn_team_unit(BLUE, RED, DVec3::ZERO),
        Err(SimError::NotDeploying)
    );
}

// ---- Phases ----

#[test]
fn test_deployment_does_not_advance() {
    let mut engine = engine_with(small_unit(4));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    assert!(engine.give_command(unit, CommandKind::Move, DVec3::new(10.0, 0.0, 0.0), None));
    for _ in 0..20 {
        engine.tick();
    }
    assert_eq!(engine.time().tick, 0);
    let first = controller(&engine, unit).roster[0];
    let pos = engine.world().get::<&Position>(first).unwrap().0;
    assert!(pos.x < 1.0, "soldiers moved while deploying");
}

#[test]
fn test_pause_resume() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    engine.queue_command(PlayerCommand::Fight);
    let snap = engine.tick();
    assert_eq!(snap.phase, GamePhase::Active);
    assert!(snap
        .events
        .contains(&SimEvent::PhaseChanged { from: GamePhase::Deployment, to: GamePhase::Active }));
    assert_eq!(engine.time().tick, 1);

    engine.queue_command(PlayerCommand::Pause);
    engine.tick();
    engine.tick();
    assert_eq!(engine.phase(), GamePhase::Paused);
    assert!(!engine.is_playing());
    assert_eq!(engine.time().tick, 1);

    engine.queue_command(PlayerCommand::Resume);
    engine.tick();
    assert_eq!(engine.time().tick, 2);
}

#[test]
fn test_time_scale_clamped() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    engine.queue_command(PlayerCommand::SetTimeScale { scale: 10.0 });
    assert_eq!(engine.tick().time_scale, 4.0);
    engine.queue_command(PlayerCommand::SetTimeScale { scale: -1.0 });
    engine.tick();
    assert_eq!(engine.time_scale(), 0.0);
}

#[test]
fn test_zero_time_scale_stops_time() {
    let mut engine = engine_with(small_unit(2));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.queue_command(PlayerCommand::Fight);
    engine.queue_command(PlayerCommand::SetTimeScale { scale: 0.0 });
    engine.tick();
    engine.give_command(unit, CommandKind::Move, DVec3::new(10.0, 0.0, 0.0), None);

    let before = engine.snapshot();
    for _ in 0..20 {
        engine.tick();
    }
    let after = engine.snapshot();
    assert_eq!(after.phase, GamePhase::Active);
    assert_eq!(after.time.tick, before.time.tick);
    for (a, b) in before.soldiers.iter().zip(&after.soldiers) {
        assert_eq!(a.position, b.position);
    }

    engine.queue_command(PlayerCommand::SetTimeScale { scale: 1.0 });
    assert_eq!(engine.tick().time.tick, before.time.tick + 1);
}

#[test]
fn test_reset_clears_battlefield() {
    let mut engine = engine_with(small_unit(2));
    engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.spawn_obstacle(DVec3::new(5.0, 0.0, 5.0));
    engine.queue_command(PlayerCommand::Fight);
    for _ in 0..10 {
        engine.tick();
    }

    engine.queue_command(PlayerCommand::Reset);
    let snap = engine.tick();
    assert_eq!(snap.phase, GamePhase::Deployment);
    assert!(snap.units.is_empty());
    assert!(snap.soldiers.is_empty());
    assert!(snap.obstacles.is_empty());
    assert_eq!(snap.time.tick, 0);
    assert_eq!(engine.remaining_units_to_place(BLUE), 5);
}

// ---- Commands ----

#[test]
fn test_move_command_resets_idle_count() {
    let mut engine = engine_with(small_unit(6));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.queue_command(PlayerCommand::Order {
        unit: entity_id(unit),
        kind: CommandKind::Move,
        position: DVec3::new(8.0, 0.0, -4.0),
        enemy: None,
    });
    let snap = engine.tick();

    let c = controller(&engine, unit);
    assert_eq!(c.idle_count, 0);
    assert_eq!(c.state, UnitState::Moving);
    assert_eq!(c.command_target, DVec3::new(8.0, 0.0, -4.0));
    assert_eq!(c.formation_targets.len(), 6);
    assert!(soldier_states(&engine, unit)
        .iter()
        .all(|s| *s == SoldierState::Moving));
    assert!(snap.events.iter().any(|e| matches!(
        e,
        SimEvent::UnitStateChanged { to: UnitState::Moving, .. }
    )));
}

#[test]
fn test_order_for_missing_unit_is_ignored() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    engine.queue_command(PlayerCommand::Order {
        unit: 0,
        kind: CommandKind::Move,
        position: DVec3::ZERO,
        enemy: None,
    });
    engine.queue_command(PlayerCommand::Order {
        unit: u64::MAX,
        kind: CommandKind::Attack,
        position: DVec3::ZERO,
        enemy: Some(7),
    });
    let snap = engine.tick();
    assert!(snap.units.is_empty());
}

#[test]
fn test_attack_without_enemy_is_a_move() {
    let mut engine = engine_with(small_unit(3));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    let friend = engine.spawn_team_unit(BLUE, RED, DVec3::new(20.0, 0.0, 0.0)).unwrap();
    assert!(engine.give_command(unit, CommandKind::Attack, DVec3::new(5.0, 0.0, 0.0), Some(friend)));
    let c = controller(&engine, unit);
    assert_eq!(c.state, UnitState::Moving);
    assert!(c.enemy_unit.is_none());
}

#[test]
fn test_attack_seeks_then_engages() {
    let mut engine = engine_with(small_unit(3));
    let blue = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    let red = engine.spawn_team_unit(RED, BLUE, DVec3::new(30.0, 0.0, 0.0)).unwrap();
    engine.queue_command(PlayerCommand::Fight);
    engine.tick();

    assert!(engine.give_command(blue, CommandKind::Attack, DVec3::new(30.0, 0.0, 0.0), Some(red)));
    assert_eq!(controller(&engine, blue).state, UnitState::Seeking);
    assert_eq!(controller(&engine, blue).enemy_unit, Some(red));

    let mut engaged = false;
    for _ in 0..1500 {
        let snap = engine.tick();
        assert_unit_invariants(&engine);
        if snap
            .units
            .iter()
            .any(|u| u.id == entity_id(blue) && u.state == UnitState::Attacking)
        {
            engaged = true;
            let view = snap.units.iter().find(|u| u.id == entity_id(blue)).unwrap();
            assert!(view.attack_line.is_some());
            break;
        }
    }
    assert!(engaged, "seeking unit never made contact");
}

#[test]
fn test_attack_follows_a_moving_enemy() {
    let tolerance = phalanx_core::constants::RETARGET_EPSILON + 1e-9;
    let mut engine = engine_with(small_unit(3));
    let blue = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    let red = engine.spawn_team_unit(RED, BLUE, DVec3::new(40.0, 0.0, 0.0)).unwrap();
    engine.queue_command(PlayerCommand::Fight);
    engine.tick();

    assert!(engine.give_command(blue, CommandKind::Attack, DVec3::new(40.0, 0.0, 0.0), Some(red)));
    assert!(engine.give_command(red, CommandKind::Move, DVec3::new(40.0, 0.0, 40.0), None));
    let start_z = controller(&engine, red).bounds_centroid.z;

    for _ in 0..200 {
        engine.tick();
        assert_unit_invariants(&engine);
        let attacker = controller(&engine, blue);
        assert!(matches!(attacker.state, UnitState::Seeking | UnitState::Attacking));

        let aim = flatten(controller(&engine, red).bounds_centroid);
        let target = flatten(attacker.command_target);
        assert!(
            target.distance(aim) <= tolerance,
            "command target {target} strayed from enemy centroid {aim}"
        );

        assert_eq!(attacker.formation_targets.len(), attacker.roster.len());
        let mean = attacker.formation_targets.iter().copied().sum::<DVec3>()
            / attacker.formation_targets.len() as f64;
        assert!(
            flatten(mean).distance(aim) <= tolerance + 1e-9,
            "formation centered on {mean}, enemy at {aim}"
        );
    }

    let moved = controller(&engine, red).bounds_centroid.z - start_z;
    assert!(moved > 3.0, "enemy only moved {moved}");
}

#[test]
fn test_retreat_holds_fire_until_idle() {
    // Harmless pursuers: the chasing enemy keeps contact the whole way.
    let mut engine = SimulationEngine::new(SimConfig {
        unit: small_unit(2),
        agent: AgentProfile {
            damage_per_second: 0.0,
            ..Default::default()
        },
        ..Default::default()
    });
    let blue = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.spawn_team_unit(RED, BLUE, DVec3::new(3.0, 0.0, 0.0)).unwrap();
    engine.queue_command(PlayerCommand::Fight);
    engine.tick();
    assert_eq!(controller(&engine, blue).state, UnitState::Attacking);

    assert!(engine.give_command(blue, CommandKind::Retreat, DVec3::new(-30.0, 0.0, 0.0), None));
    let c = controller(&engine, blue);
    assert_eq!(c.state, UnitState::Retreating);
    assert!(c.hold_fire);
    assert_eq!(c.engaged_count, 0);
    for &s in &c.roster {
        let agent = engine.world().get::<&SoldierAgent>(s).unwrap();
        assert_eq!(agent.state, SoldierState::Moving);
        assert!(agent.enemy.is_none());
    }

    engine.tick();
    assert_unit_invariants(&engine);
    assert!(soldier_states(&engine, blue)
        .iter()
        .all(|s| *s != SoldierState::Attacking));

    let mut settled = false;
    for _ in 0..3000 {
        engine.tick();
        if controller(&engine, blue).state == UnitState::Idle {
            settled = true;
            break;
        }
    }
    assert!(settled, "retreating unit never settled");
    assert!(!controller(&engine, blue).hold_fire);
}

#[test]
fn test_idle_invariant_during_move() {
    let mut engine = engine_with(small_unit(9));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.spawn_obstacle(DVec3::new(6.0, 0.0, 0.5));
    engine.queue_command(PlayerCommand::Fight);
    engine.queue_command(PlayerCommand::Order {
        unit: entity_id(unit),
        kind: CommandKind::Move,
        position: DVec3::new(12.0, 0.0, 0.0),
        enemy: None,
    });
    for _ in 0..600 {
        engine.tick();
        assert_unit_invariants(&engine);
    }
}

// ---- Death cascade ----

#[test]
fn test_single_soldier_unit_destroyed_once() {
    let mut engine = engine_with(small_unit(1));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.queue_command(PlayerCommand::Fight);
    engine.tick();

    let soldier = controller(&engine, unit).roster[0];
    kill_soldier(&mut engine, soldier);
    let snap = engine.tick();
    let destroyed: Vec<_> = snap
        .events
        .iter()
        .filter(|e| matches!(e, SimEvent::UnitDestroyed { .. }))
        .collect();
    assert_eq!(destroyed.len(), 1);
    assert!(snap.events.contains(&SimEvent::SoldierKilled {
        soldier: entity_id(soldier),
        unit: entity_id(unit),
    }));
    assert!(!engine.world().contains(unit));
    assert!(!engine.world().contains(soldier));

    let later = engine.tick();
    assert!(later.events.is_empty());
    assert!(later.units.is_empty());
}

#[test]
fn test_unit_survives_until_last_soldier() {
    let mut engine = engine_with(small_unit(3));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.queue_command(PlayerCommand::Fight);
    engine.tick();

    let roster = controller(&engine, unit).roster;
    for (i, &soldier) in roster.iter().enumerate() {
        kill_soldier(&mut engine, soldier);
        let snap = engine.tick();
        let destroyed = snap
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::UnitDestroyed { .. }))
            .count();
        if i + 1 < roster.len() {
            assert_eq!(destroyed, 0);
            let c = controller(&engine, unit);
            assert_eq!(c.roster.len(), roster.len() - i - 1);
            assert_eq!(c.idle_count, c.roster.len());
            assert_eq!(c.state, UnitState::Idle);
        } else {
            assert_eq!(destroyed, 1);
        }
    }
    assert!(!engine.world().contains(unit));
}

#[test]
fn test_enemy_unit_destroyed_falls_back_to_moving() {
    let mut engine = engine_with(small_unit(1));
    let blue = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    let red = engine.spawn_team_unit(RED, BLUE, DVec3::new(30.0, 0.0, 0.0)).unwrap();
    engine.queue_command(PlayerCommand::Fight);
    engine.tick();
    engine.give_command(blue, CommandKind::Attack, DVec3::new(30.0, 0.0, 0.0), Some(red));
    engine.tick();

    let red_soldier = controller(&engine, red).roster[0];
    kill_soldier(&mut engine, red_soldier);
    engine.tick();
    let c = controller(&engine, blue);
    assert!(c.enemy_unit.is_none());
    assert_ne!(c.state, UnitState::Seeking);
    assert_ne!(c.state, UnitState::Attacking);
    assert_unit_invariants(&engine);
}

// ---- Selection ----

#[test]
fn test_select_deselects_previous() {
    let mut engine = engine_with(small_unit(2));
    let a = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    let b = engine.spawn_team_unit(BLUE, RED, DVec3::new(20.0, 0.0, 0.0)).unwrap();

    engine.queue_command(PlayerCommand::SelectUnit { unit: entity_id(a) });
    let snap = engine.tick();
    assert_eq!(snap.selected_unit, Some(entity_id(a)));
    assert!(snap
        .soldiers
        .iter()
        .filter(|s| s.unit == entity_id(a))
        .all(|s| s.selector == Selector { visible: true, emphasized: true }));

    engine.queue_command(PlayerCommand::SelectUnit { unit: entity_id(b) });
    let snap = engine.tick();
    assert_eq!(snap.selected_unit, Some(entity_id(b)));
    assert!(snap.units.iter().find(|u| u.id == entity_id(b)).unwrap().is_selected);
    assert!(!snap.units.iter().find(|u| u.id == entity_id(a)).unwrap().is_selected);
    assert!(snap
        .soldiers
        .iter()
        .filter(|s| s.unit == entity_id(a))
        .all(|s| s.selector == Selector::default()));

    engine.queue_command(PlayerCommand::ClearSelection);
    let snap = engine.tick();
    assert!(snap.selected_unit.is_none());
    assert!(snap.soldiers.iter().all(|s| !s.selector.emphasized));
}

#[test]
fn test_hover_ignored_on_selected_unit() {
    let mut engine = engine_with(small_unit(2));
    let a = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    let b = engine.spawn_team_unit(BLUE, RED, DVec3::new(20.0, 0.0, 0.0)).unwrap();

    engine.queue_command(PlayerCommand::HoverUnit { unit: entity_id(b), hovered: true });
    let snap = engine.tick();
    assert!(snap
        .soldiers
        .iter()
        .filter(|s| s.unit == entity_id(b))
        .all(|s| s.selector.visible && !s.selector.emphasized));

    engine.queue_command(PlayerCommand::SelectUnit { unit: entity_id(a) });
    engine.queue_command(PlayerCommand::HoverUnit { unit: entity_id(a), hovered: false });
    let snap = engine.tick();
    assert!(snap
        .soldiers
        .iter()
        .filter(|s| s.unit == entity_id(a))
        .all(|s| s.selector.emphasized));
}

#[test]
fn test_pick_unit_hits_bounds() {
    let mut engine = engine_with(small_unit(4));
    let a = engine.spawn_team_unit(BLUE, RED, DVec3::new(10.0, 0.0, 10.0)).unwrap();
    assert_eq!(engine.pick_unit(DVec3::new(10.0, 0.0, 10.0)), Some(a));
    assert_eq!(engine.pick_unit(DVec3::new(40.0, 0.0, 40.0)), None);
}

#[test]
fn test_selected_unit_cleared_on_destruction() {
    let mut engine = engine_with(small_unit(1));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.queue_command(PlayerCommand::SelectUnit { unit: entity_id(unit) });
    engine.queue_command(PlayerCommand::Fight);
    engine.tick();
    assert_eq!(engine.selected_unit(), Some(unit));

    let soldier = controller(&engine, unit).roster[0];
    kill_soldier(&mut engine, soldier);
    engine.tick();
    assert!(engine.selected_unit().is_none());
}

// ---- Combat ----

#[test]
fn test_obstacles_are_never_attacked() {
    let mut engine = engine_with(small_unit(1));
    let unit = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.spawn_obstacle(DVec3::new(1.0, 0.0, -2.0));
    engine.queue_command(PlayerCommand::Fight);
    for _ in 0..50 {
        engine.tick();
    }
    assert!(soldier_states(&engine, unit)
        .iter()
        .all(|s| *s != SoldierState::Attacking));
}

#[test]
fn test_melee_kills_and_updates_rosters() {
    let mut engine = SimulationEngine::new(SimConfig {
        unit: small_unit(1),
        agent: AgentProfile {
            damage_per_second: 200.0,
            damage_variance: 0.0,
            ..Default::default()
        },
        ..Default::default()
    });
    let blue = engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    let red = engine.spawn_team_unit(RED, BLUE, DVec3::new(1.0, 0.0, 0.0)).unwrap();
    engine.queue_command(PlayerCommand::Fight);

    let mut destroyed = Vec::new();
    for _ in 0..100 {
        let snap = engine.tick();
        assert_unit_invariants(&engine);
        for event in snap.events {
            if let SimEvent::UnitDestroyed { unit, .. } = event {
                destroyed.push(unit);
            }
        }
    }
    // Equal soldiers trading equal blows fall on the same tick.
    destroyed.sort_unstable();
    let mut expected = vec![entity_id(blue), entity_id(red)];
    expected.sort_unstable();
    assert_eq!(destroyed, expected);
}

// ---- Snapshot ----

#[test]
fn test_snapshot_serializes() {
    let mut engine = engine_with(small_unit(3));
    engine.spawn_team_unit(BLUE, RED, DVec3::ZERO).unwrap();
    engine.spawn_team_unit(RED, BLUE, DVec3::new(0.0, 0.0, 20.0)).unwrap();
    engine.spawn_obstacle(DVec3::new(4.0, 0.0, 4.0));
    let snap = engine.tick();
    assert_eq!(snap.units.len(), 2);
    assert_eq!(snap.soldiers.len(), 6);
    assert_eq!(snap.obstacles.len(), 1);
    assert_eq!(
        snap.events
            .iter()
            .filter(|e| matches!(e, SimEvent::UnitSpawned { .. }))
            .count(),
        2
    );
    let json = serde_json::to_string(&snap).unwrap();
    assert!(json.contains("\"units\""));
}
