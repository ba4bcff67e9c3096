//! Entity spawn factories for setting up the battlefield.
//!
//! Creates units with their full soldier roster, and static obstacles.

use glam::DVec3;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use phalanx_agent::combat::draw_damage_factor;
use phalanx_agent::formation;
use phalanx_agent::fsm;
use phalanx_agent::profiles::{AgentProfile, UnitProfile};
use phalanx_core::components::{Health, Locomotion, Obstacle, Selector, Weapon};
use phalanx_core::constants::BOUNDS_HEIGHT;
use phalanx_core::enums::SoldierState;
use phalanx_core::types::{flatten, Aabb, Position, Rgb, TeamId, Velocity};

use crate::components::{SoldierAgent, UnitController};
use crate::error::SimError;

/// Everything needed to place one unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitSpawn {
    pub team: TeamId,
    pub enemy_team: TeamId,
    pub position: DVec3,
    pub color: Rgb,
}

/// Reject layouts that would leave a unit without a usable roster.
pub fn validate(spawn: &UnitSpawn, layout: &UnitProfile) -> Result<(), SimError> {
    if layout.soldiers == 0 {
        return Err(SimError::EmptyRoster);
    }
    if layout.rows == 0 {
        return Err(SimError::NoRows);
    }
    if spawn.team == spawn.enemy_team {
        return Err(SimError::SameTeam(spawn.team));
    }
    Ok(())
}

/// Spawn a unit and its roster in formation around `spawn.position`.
/// Soldiers start `Idle` on their slots.
pub fn spawn_unit(
    world: &mut World,
    spawn: &UnitSpawn,
    layout: &UnitProfile,
    agent: &AgentProfile,
    seed: u64,
    next_serial: &mut u64,
) -> Result<Entity, SimError> {
    validate(spawn, layout)?;

    let center = flatten(spawn.position);
    let unit = world.spawn((UnitController::new(
        spawn.team,
        spawn.enemy_team,
        spawn.color,
        layout.clone(),
    ),));

    let slots = formation::targets(center, layout.soldiers, layout);
    let mut roster = Vec::with_capacity(slots.len());
    for &slot in &slots {
        let soldier = spawn_soldier(world, unit, spawn, slot, agent, seed, *next_serial);
        *next_serial += 1;
        roster.push(soldier);
    }

    let bounds = Aabb::enclosing(slots.iter().copied())
        .map(|b| b.padded(layout.bounds_padding, BOUNDS_HEIGHT));

    if let Ok(mut controller) = world.get::<&mut UnitController>(unit) {
        controller.idle_count = roster.len();
        controller.roster = roster;
        controller.command_target = center;
        controller.formation_targets = slots;
        controller.bounds = bounds;
        controller.bounds_centroid = bounds.map(|b| b.center()).unwrap_or(center);
    }

    Ok(unit)
}

/// Spawn a single soldier on its slot.
fn spawn_soldier(
    world: &mut World,
    unit: Entity,
    spawn: &UnitSpawn,
    slot: DVec3,
    agent: &AgentProfile,
    seed: u64,
    serial: u64,
) -> Entity {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(serial));
    let damage_factor = draw_damage_factor(&mut rng, agent.damage_variance);

    let mut locomotion = Locomotion {
        target: slot,
        ..Default::default()
    };
    fsm::refresh(&mut locomotion, slot, true);

    world.spawn((
        SoldierAgent {
            unit,
            team: spawn.team,
            state: SoldierState::Idle,
            enemy: None,
        },
        Position(slot),
        Velocity::default(),
        locomotion,
        Health {
            current: agent.max_health,
            max: agent.max_health,
        },
        Weapon {
            damage_per_second: agent.damage_per_second,
            damage_factor,
        },
        Selector::default(),
    ))
}

/// Spawn a static obstacle.
pub fn spawn_obstacle(world: &mut World, position: DVec3) -> Entity {
    world.spawn((Obstacle, Position(flatten(position))))
}
