//! Unit controller operations: command surface, formation dispatch, bounds
//! maintenance and the death cascade.

use glam::DVec3;
use hecs::{Entity, World};
use tracing::debug;

use phalanx_agent::formation;
use phalanx_agent::fsm::{self, Retarget, Transition};
use phalanx_core::components::Locomotion;
use phalanx_core::constants::BOUNDS_HEIGHT;
use phalanx_core::enums::{CommandKind, SoldierState, UnitState};
use phalanx_core::events::SimEvent;
use phalanx_core::types::{Aabb, Position};

use crate::components::{SoldierAgent, UnitController};

/// Pending changes to a unit's idle and engaged counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub idle: i32,
    pub engaged: i32,
}

impl CounterDelta {
    pub fn add(&mut self, transition: Transition) {
        self.idle += transition.idle_delta();
        self.engaged += transition.engaged_delta();
    }

    fn add_all(&mut self, transitions: impl IntoIterator<Item = Transition>) {
        for t in transitions {
            self.add(t);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.idle == 0 && self.engaged == 0
    }

    /// Commit onto the controller's counters.
    pub fn apply(&self, controller: &mut UnitController) {
        let roster = controller.roster.len() as i64;
        controller.idle_count = (controller.idle_count as i64 + self.idle as i64).clamp(0, roster) as usize;
        controller.engaged_count =
            (controller.engaged_count as i64 + self.engaged as i64).clamp(0, roster) as usize;
    }
}

/// Stable id of an entity, as carried in commands and snapshots.
pub fn entity_id(entity: Entity) -> u64 {
    entity.to_bits().get()
}

/// Resolve an id from a command back to an entity handle.
pub fn entity_from_id(id: u64) -> Option<Entity> {
    Entity::from_bits(id)
}

/// Whether `entity` is a live unit.
pub fn is_unit(world: &World, entity: Entity) -> bool {
    world.get::<&UnitController>(entity).is_ok()
}

/// Bounds centroid of a live unit.
pub fn centroid(world: &World, unit: Entity) -> Option<DVec3> {
    world.get::<&UnitController>(unit).ok().map(|c| c.bounds_centroid)
}

/// Give a unit an order. Accepted in any aggregate state; returns false if
/// the unit no longer exists.
pub fn give_command(
    world: &mut World,
    unit: Entity,
    kind: CommandKind,
    position: DVec3,
    enemy: Option<Entity>,
    events: &mut Vec<SimEvent>,
) -> bool {
    let (team, previous, roster) = match world.get::<&UnitController>(unit) {
        Ok(c) => (c.team, c.state, c.roster.clone()),
        Err(_) => return false,
    };

    // Attack needs a live unit of another team; otherwise it is a plain move.
    let enemy_unit = match kind {
        CommandKind::Attack => enemy.filter(|&e| {
            e != unit
                && world
                    .get::<&UnitController>(e)
                    .map(|c| c.team != team && !c.roster.is_empty())
                    .unwrap_or(false)
        }),
        CommandKind::Move | CommandKind::Retreat => None,
    };

    let mut delta = CounterDelta::default();
    if kind == CommandKind::Retreat {
        for &soldier in &roster {
            if let Ok(agent) = world.query_one_mut::<&mut SoldierAgent>(soldier) {
                if let Some(t) = fsm::disengage(&mut agent.state) {
                    delta.add(t);
                }
                agent.enemy = None;
            }
        }
    }

    let (targets, dispatched) = retarget_roster(world, unit, &roster, position);
    delta.add_all(dispatched);

    let state = match (kind, enemy_unit) {
        (CommandKind::Retreat, _) => UnitState::Retreating,
        (CommandKind::Attack, Some(_)) => UnitState::Seeking,
        _ => UnitState::Moving,
    };

    if let Ok(mut controller) = world.get::<&mut UnitController>(unit) {
        delta.apply(&mut controller);
        controller.command_target = position;
        controller.formation_targets = targets;
        controller.enemy_unit = enemy_unit;
        controller.enemy_aim = None;
        controller.hold_fire = kind == CommandKind::Retreat;
        controller.state = state;
    }

    debug!(unit = entity_id(unit), ?kind, ?position, ?previous, ?state, "unit order");
    if previous != state {
        events.push(SimEvent::UnitStateChanged {
            unit: entity_id(unit),
            from: previous,
            to: state,
        });
    }
    true
}

/// Push fresh formation slots around `center` to every live soldier and
/// commit the resulting counter changes.
pub fn dispatch_formation(world: &mut World, unit: Entity, center: DVec3) {
    let roster = match world.get::<&UnitController>(unit) {
        Ok(c) => c.roster.clone(),
        Err(_) => return,
    };
    let (targets, transitions) = retarget_roster(world, unit, &roster, center);
    if let Ok(mut controller) = world.get::<&mut UnitController>(unit) {
        let mut delta = CounterDelta::default();
        delta.add_all(transitions);
        delta.apply(&mut controller);
        controller.formation_targets = targets;
    }
}

/// Recompute the padded bounding volume over live soldier positions.
/// An empty roster keeps the last bounds; the unit is about to be removed.
pub fn refresh_bounds(world: &World, unit: Entity) -> Option<Aabb> {
    let controller = world.get::<&UnitController>(unit).ok()?;
    let positions = controller
        .roster
        .iter()
        .filter_map(|&s| world.get::<&Position>(s).ok().map(|p| p.0))
        .collect::<Vec<_>>();
    let bounds = Aabb::enclosing(positions)?.padded(controller.layout.bounds_padding, BOUNDS_HEIGHT);
    Some(bounds)
}

/// Store freshly computed bounds on the controller.
pub fn store_bounds(world: &mut World, unit: Entity, bounds: Aabb) {
    if let Ok(mut controller) = world.get::<&mut UnitController>(unit) {
        controller.bounds = Some(bounds);
        controller.bounds_centroid = bounds.center();
    }
}

/// Remove a dead soldier from its unit's roster. Returns true when the roster
/// just became empty.
pub fn update_on_death(world: &mut World, unit: Entity, soldier: Entity, state: SoldierState) -> bool {
    let Ok(mut controller) = world.get::<&mut UnitController>(unit) else {
        return false;
    };
    let before = controller.roster.len();
    controller.roster.retain(|&s| s != soldier);
    if controller.roster.len() == before {
        return false;
    }

    match state {
        SoldierState::Idle => controller.idle_count = controller.idle_count.saturating_sub(1),
        SoldierState::Attacking => {
            controller.engaged_count = controller.engaged_count.saturating_sub(1);
        }
        SoldierState::Moving => {}
    }
    let roster = controller.roster.len();
    controller.idle_count = controller.idle_count.min(roster);
    controller.engaged_count = controller.engaged_count.min(roster);

    roster == 0
}

/// Retarget every roster soldier to its slot around `center`. Attacking
/// soldiers keep fighting and ignore the new slot.
fn retarget_roster(
    world: &mut World,
    unit: Entity,
    roster: &[Entity],
    center: DVec3,
) -> (Vec<DVec3>, Vec<Transition>) {
    let layout = match world.get::<&UnitController>(unit) {
        Ok(c) => c.layout.clone(),
        Err(_) => return (Vec::new(), Vec::new()),
    };
    let targets = formation::targets(center, roster.len(), &layout);
    let mut transitions = Vec::new();

    for (&soldier, &target) in roster.iter().zip(&targets) {
        let Ok((agent, locomotion, position)) =
            world.query_one_mut::<(&mut SoldierAgent, &mut Locomotion, &Position)>(soldier)
        else {
            continue;
        };
        if let Retarget::Accepted(Some(t)) =
            fsm::retarget(&mut agent.state, locomotion, position.0, target)
        {
            transitions.push(t);
        }
    }

    (targets, transitions)
}
