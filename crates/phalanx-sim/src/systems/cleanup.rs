//! Cleanup system: the death cascade.
//!
//! Removes dead soldiers from the world and their unit's roster, then removes
//! units whose roster became empty.

use std::collections::HashSet;

use hecs::{Entity, World};
use tracing::info;

use phalanx_agent::combat::is_alive;
use phalanx_core::components::Health;
use phalanx_core::enums::SoldierState;
use phalanx_core::events::SimEvent;

use crate::components::{SoldierAgent, UnitController};
use crate::unit::{entity_id, update_on_death};

/// Despawn dead soldiers and emptied units.
///
/// `shrunk` receives every surviving unit that lost a soldier; their bounds
/// must be recomputed. Returns the units destroyed this tick.
pub fn run(
    world: &mut World,
    despawn_buffer: &mut Vec<Entity>,
    shrunk: &mut HashSet<Entity>,
    events: &mut Vec<SimEvent>,
) -> Vec<Entity> {
    despawn_buffer.clear();

    let mut dead: Vec<(Entity, Entity, SoldierState)> = world
        .query::<(&SoldierAgent, &Health)>()
        .iter()
        .filter(|(_, (_, health))| !is_alive(health))
        .map(|(entity, (agent, _))| (entity, agent.unit, agent.state))
        .collect();
    dead.sort_by_key(|(entity, _, _)| entity_id(*entity));

    let mut destroyed = Vec::new();
    for (soldier, unit, state) in dead {
        let _ = world.despawn(soldier);
        events.push(SimEvent::SoldierKilled {
            soldier: entity_id(soldier),
            unit: entity_id(unit),
        });

        if update_on_death(world, unit, soldier, state) {
            despawn_buffer.push(unit);
            shrunk.remove(&unit);
        } else {
            shrunk.insert(unit);
        }
    }

    for unit in despawn_buffer.drain(..) {
        let Ok(team) = world.get::<&UnitController>(unit).map(|c| c.team) else {
            continue;
        };
        let _ = world.despawn(unit);
        info!(unit = entity_id(unit), ?team, "unit destroyed");
        events.push(SimEvent::UnitDestroyed {
            unit: entity_id(unit),
            team,
        });
        destroyed.push(unit);
    }

    destroyed
}
