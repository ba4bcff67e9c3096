//! Snapshot system: queries the ECS world and builds a complete BattleSnapshot.
//!
//! Read-only. Views are sorted by id so equal worlds serialize identically.

use std::collections::BTreeMap;

use glam::DVec3;
use hecs::{Entity, World};

use phalanx_agent::aggregate::tracks_enemy;
use phalanx_core::components::{Health, Obstacle, Selector};
use phalanx_core::enums::GamePhase;
use phalanx_core::events::SimEvent;
use phalanx_core::state::*;
use phalanx_core::types::{Position, SimTime, Team, TeamId, Velocity};

use crate::components::{SoldierAgent, UnitController};
use crate::unit::{centroid, entity_id};

/// Engine-level state the snapshot needs besides the world.
pub struct SnapshotContext<'a> {
    pub time: SimTime,
    pub phase: GamePhase,
    pub time_scale: f64,
    pub teams: &'a [Team],
    pub remaining: &'a BTreeMap<TeamId, u32>,
    pub selected: Option<Entity>,
}

/// Build a complete BattleSnapshot from the current world state.
pub fn build_snapshot(world: &World, ctx: &SnapshotContext<'_>, events: Vec<SimEvent>) -> BattleSnapshot {
    let units = build_units(world, ctx.selected);
    BattleSnapshot {
        time: ctx.time,
        phase: ctx.phase,
        time_scale: ctx.time_scale,
        teams: build_teams(ctx, &units),
        units,
        soldiers: build_soldiers(world),
        obstacles: build_obstacles(world),
        selected_unit: ctx.selected.map(entity_id),
        events,
    }
}

fn build_units(world: &World, selected: Option<Entity>) -> Vec<UnitView> {
    let mut units: Vec<UnitView> = world
        .query::<&UnitController>()
        .iter()
        .map(|(entity, c)| {
            let enemy_centroid = c.enemy_unit.and_then(|e| centroid(world, e));
            let attack_line = if tracks_enemy(c.state) {
                enemy_centroid.map(|target| (c.bounds_centroid, target))
            } else {
                None
            };
            UnitView {
                id: entity_id(entity),
                team: c.team,
                enemy_team: c.enemy_team,
                color: c.color,
                state: c.state,
                soldiers_alive: c.roster.len(),
                idle_count: c.idle_count,
                command_target: c.command_target,
                bounds: c.bounds,
                bounds_centroid: c.bounds_centroid,
                formation_targets: c.formation_targets.clone(),
                enemy_unit: c.enemy_unit.map(entity_id),
                attack_line,
                is_selected: selected == Some(entity),
            }
        })
        .collect();
    units.sort_by_key(|u| u.id);
    units
}

fn build_soldiers(world: &World) -> Vec<SoldierView> {
    let mut soldiers: Vec<SoldierView> = world
        .query::<(&SoldierAgent, &Position, &Velocity, &Health, &Selector)>()
        .iter()
        .map(|(entity, (agent, pos, vel, health, selector))| SoldierView {
            id: entity_id(entity),
            unit: entity_id(agent.unit),
            team: agent.team,
            position: pos.0,
            velocity: vel.0,
            state: agent.state,
            health: health.current,
            enemy: agent.enemy.map(entity_id),
            selector: *selector,
        })
        .collect();
    soldiers.sort_by_key(|s| s.id);
    soldiers
}

fn build_obstacles(world: &World) -> Vec<DVec3> {
    let mut obstacles: Vec<(u64, DVec3)> = world
        .query::<(&Obstacle, &Position)>()
        .iter()
        .map(|(entity, (_, pos))| (entity_id(entity), pos.0))
        .collect();
    obstacles.sort_by_key(|(id, _)| *id);
    obstacles.into_iter().map(|(_, p)| p).collect()
}

fn build_teams(ctx: &SnapshotContext<'_>, units: &[UnitView]) -> Vec<TeamView> {
    ctx.teams
        .iter()
        .map(|team| TeamView {
            id: team.id,
            name: team.name.clone(),
            color: team.color,
            remaining_units_to_place: ctx.remaining.get(&team.id).copied().unwrap_or(0),
            units_alive: units.iter().filter(|u| u.team == team.id).count(),
        })
        .collect()
}
