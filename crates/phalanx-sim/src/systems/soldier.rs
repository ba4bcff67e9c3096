//! Soldier system: runs the soldier FSM for every agent.
//!
//! Evaluation reads only the committed world and the spatial index built
//! from it. Results are committed afterwards; counter changes, engagement
//! reports and formation requests are gathered per unit, strikes are
//! buffered for the combat system.

use std::collections::HashMap;

use hecs::{Entity, World};
use tracing::{debug, trace};

use phalanx_agent::combat::tick_damage;
use phalanx_agent::fsm::{evaluate, Contact, Neighbor, SoldierContext, SoldierUpdate};
use phalanx_agent::profiles::AgentProfile;
use phalanx_core::components::{Locomotion, Weapon};
use phalanx_core::constants::DT;
use phalanx_core::enums::Allegiance;
use phalanx_core::types::{Position, TeamId, Velocity};

use crate::components::{SoldierAgent, UnitController};
use crate::spatial::{Occupant, OccupantKind, SpatialIndex};
use crate::unit::{entity_id, CounterDelta};

/// Messages from soldiers to their unit, committed after all soldiers.
#[derive(Debug, Clone, Default)]
pub struct UnitReport {
    pub counters: CounterDelta,
    /// Enemy unit of the first engagement reported this tick.
    pub engaged_enemy_unit: Option<Entity>,
    pub wants_formation: bool,
}

/// Damage to apply to `target` once every soldier has been evaluated.
#[derive(Debug, Clone, Copy)]
pub struct Strike {
    pub attacker: Entity,
    pub target: Entity,
    pub amount: f64,
}

/// Run the soldier FSM for every soldier, commit their own state, and fill
/// `reports` and `strikes`.
pub fn run(
    world: &mut World,
    index: &SpatialIndex,
    profile: &AgentProfile,
    reports: &mut HashMap<Entity, UnitReport>,
    strikes: &mut Vec<Strike>,
) {
    let hold_fire: HashMap<Entity, bool> = world
        .query::<&UnitController>()
        .iter()
        .map(|(entity, unit)| (entity, unit.hold_fire))
        .collect();

    let mut updates: Vec<(Entity, Entity, f64, SoldierUpdate<Entity>)> = Vec::new();
    {
        let mut neighbors: Vec<Neighbor<Entity>> = Vec::new();
        let mut query = world.query::<(&SoldierAgent, &Position, &Velocity, &Locomotion, &Weapon)>();
        for (entity, (agent, pos, vel, locomotion, weapon)) in query.iter() {
            neighbors.clear();
            index.for_each_nearby(pos.0, profile.query_radius(), |occupant| {
                if occupant.entity != entity {
                    neighbors.push(Neighbor {
                        handle: occupant.entity,
                        position: occupant.position,
                        allegiance: classify(agent.team, occupant),
                    });
                }
            });

            // Re-fetched every tick; a despawned enemy resolves to none.
            let enemy = agent.enemy.and_then(|e| {
                world.get::<&Position>(e).ok().map(|p| Contact {
                    handle: e,
                    position: p.0,
                })
            });

            let ctx = SoldierContext {
                state: agent.state,
                position: pos.0,
                velocity: vel.0,
                locomotion: *locomotion,
                hold_fire: hold_fire.get(&agent.unit).copied().unwrap_or(false),
                enemy,
                neighbors: &neighbors,
                profile,
            };

            updates.push((entity, agent.unit, tick_damage(weapon, DT), evaluate(&ctx)));
        }
    }

    for (entity, unit, damage, update) in updates {
        if let Ok((agent, vel, locomotion)) =
            world.query_one_mut::<(&mut SoldierAgent, &mut Velocity, &mut Locomotion)>(entity)
        {
            agent.state = update.state;
            agent.enemy = update.enemy;
            vel.0 = update.velocity;
            *locomotion = update.locomotion;
        }

        let report = reports.entry(unit).or_default();
        if let Some(transition) = update.transition {
            trace!(
                soldier = entity_id(entity),
                from = ?transition.from,
                to = ?transition.to,
                "soldier transition"
            );
            report.counters.add(transition);
        }
        if update.wants_formation {
            report.wants_formation = true;
        }
        if let Some(enemy) = update.engaged {
            let enemy_unit = world.get::<&SoldierAgent>(enemy).ok().map(|a| a.unit);
            debug!(
                soldier = entity_id(entity),
                enemy = entity_id(enemy),
                "soldier engaged"
            );
            if report.engaged_enemy_unit.is_none() {
                report.engaged_enemy_unit = enemy_unit;
            }
        }
        if let Some(target) = update.strike {
            strikes.push(Strike {
                attacker: entity,
                target,
                amount: damage,
            });
        }
    }

    for (unit, report) in reports.iter() {
        if report.counters.is_empty() {
            continue;
        }
        if let Ok(mut controller) = world.get::<&mut UnitController>(*unit) {
            report.counters.apply(&mut controller);
        }
    }
}

/// Classify a neighbor relative to a soldier of `team`.
pub fn classify(team: TeamId, occupant: &Occupant) -> Allegiance {
    match occupant.kind {
        OccupantKind::Obstacle => Allegiance::Obstacle,
        OccupantKind::Soldier { team: other, .. } if other == team => Allegiance::Ally,
        OccupantKind::Soldier { .. } => Allegiance::Enemy,
    }
}
