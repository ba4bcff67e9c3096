//! Unit aggregation system.
//!
//! Runs after every soldier update, strike and death of the tick has been
//! committed, so the counters it reads are final for the tick.

use std::collections::{HashMap, HashSet};

use hecs::{Entity, World};
use tracing::debug;

use phalanx_agent::aggregate::{evaluate, tracks_enemy, UnitContext, UnitUpdate};
use phalanx_core::constants::RETARGET_EPSILON;
use phalanx_core::enums::UnitState;
use phalanx_core::events::SimEvent;

use super::soldier::UnitReport;
use crate::components::UnitController;
use crate::unit::{self, entity_id};

/// Recompute bounds, apply reports, run the aggregate policy and re-dispatch
/// formations for every unit.
pub fn run(
    world: &mut World,
    reports: &mut HashMap<Entity, UnitReport>,
    shrunk: &HashSet<Entity>,
    events: &mut Vec<SimEvent>,
) {
    let mut units: Vec<(Entity, UnitState, bool)> = world
        .query::<&UnitController>()
        .iter()
        .map(|(entity, c)| (entity, c.state, c.bounds.is_none()))
        .collect();
    units.sort_by_key(|(entity, _, _)| entity_id(*entity));

    // Bounds first, so every unit aims at this tick's enemy centroid.
    for &(entity, state, missing) in &units {
        if state != UnitState::Idle || missing || shrunk.contains(&entity) {
            if let Some(bounds) = unit::refresh_bounds(world, entity) {
                unit::store_bounds(world, entity, bounds);
            }
        }
    }

    for &(entity, _, _) in &units {
        let report = reports.remove(&entity).unwrap_or_default();
        aggregate_unit(world, entity, report, events);
    }
}

fn aggregate_unit(world: &mut World, entity: Entity, report: UnitReport, events: &mut Vec<SimEvent>) {
    let Ok(mut controller) = world.get::<&mut UnitController>(entity) else {
        return;
    };
    let previous = controller.state;

    // First contact names the enemy unit, unless the unit is retreating.
    let mut engaged = false;
    if let Some(enemy_unit) = report.engaged_enemy_unit {
        if previous != UnitState::Retreating {
            engaged = true;
            if controller.enemy_unit != Some(enemy_unit) {
                controller.enemy_unit = Some(enemy_unit);
                controller.enemy_aim = None;
                events.push(SimEvent::Engaged {
                    unit: entity_id(entity),
                    enemy_unit: entity_id(enemy_unit),
                });
            }
        }
    }
    drop(controller);

    let Some((update, enemy_alive)) = policy(world, entity, engaged) else {
        return;
    };

    // Dispatches below may pull idle soldiers back to Moving.
    let mut dispatched = false;
    if update.enemy_lost {
        let hold = unit::centroid(world, entity);
        if let Ok(mut controller) = world.get::<&mut UnitController>(entity) {
            controller.enemy_unit = None;
            controller.enemy_aim = None;
            if let Some(hold) = hold {
                controller.command_target = hold;
            }
        }
        if let Some(hold) = hold {
            unit::dispatch_formation(world, entity, hold);
            dispatched = true;
        }
    }

    if tracks_enemy(update.state) {
        dispatched |= track_enemy(world, entity, report.wants_formation);
    } else if report.wants_formation && !update.enemy_lost {
        if let Some(target) = world
            .get::<&UnitController>(entity)
            .ok()
            .map(|c| c.command_target)
        {
            unit::dispatch_formation(world, entity, target);
            dispatched = true;
        }
    }

    let Ok(mut controller) = world.get::<&mut UnitController>(entity) else {
        return;
    };
    controller.state = update.state;
    if dispatched {
        let ctx = context(&controller, false, enemy_alive && !update.enemy_lost);
        controller.state = evaluate(&ctx).state;
    }

    let state = controller.state;
    if state == UnitState::Idle {
        controller.hold_fire = false;
        controller.formation_targets.clear();
    }
    if state != previous {
        debug!(unit = entity_id(entity), ?previous, ?state, "unit state");
        events.push(SimEvent::UnitStateChanged {
            unit: entity_id(entity),
            from: previous,
            to: state,
        });
    }
}

/// Evaluate the aggregate policy against committed counters. Also reports
/// whether the tracked enemy unit is still alive.
fn policy(world: &World, entity: Entity, engaged: bool) -> Option<(UnitUpdate, bool)> {
    let controller = world.get::<&UnitController>(entity).ok()?;
    let enemy_alive = controller
        .enemy_unit
        .is_some_and(|e| unit::is_unit(world, e));
    Some((evaluate(&context(&controller, engaged, enemy_alive)), enemy_alive))
}

fn context(controller: &UnitController, engaged: bool, enemy_alive: bool) -> UnitContext {
    UnitContext {
        state: controller.state,
        roster_len: controller.roster.len(),
        idle_count: controller.idle_count,
        engaged_count: controller.engaged_count,
        engagement_reported: engaged,
        enemy_alive,
    }
}

/// Follow the enemy unit's centroid. Re-dispatches when it drifted past the
/// retarget epsilon or a soldier asked for a fresh slot. Returns true if a
/// dispatch happened.
fn track_enemy(world: &mut World, entity: Entity, force: bool) -> bool {
    let Some((enemy_unit, aim)) = world
        .get::<&UnitController>(entity)
        .ok()
        .and_then(|c| c.enemy_unit.map(|e| (e, c.enemy_aim)))
    else {
        return false;
    };
    let Some(target) = unit::centroid(world, enemy_unit) else {
        return false;
    };

    let drifted = aim.map_or(true, |aim| aim.distance(target) > RETARGET_EPSILON);
    if !drifted && !force {
        return false;
    }

    if let Ok(mut controller) = world.get::<&mut UnitController>(entity) {
        controller.enemy_aim = Some(target);
        controller.command_target = target;
    }
    unit::dispatch_formation(world, entity, target);
    true
}
