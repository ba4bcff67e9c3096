//! Battle snapshot: the complete visible state handed to the UI each tick.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::components::Selector;
use crate::enums::*;
use crate::events::SimEvent;
use crate::types::{Aabb, Rgb, SimTime, TeamId};

/// Complete battle state broadcast after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub time: SimTime,
    pub phase: GamePhase,
    pub time_scale: f64,
    pub units: Vec<UnitView>,
    pub soldiers: Vec<SoldierView>,
    pub obstacles: Vec<DVec3>,
    pub teams: Vec<TeamView>,
    /// Unit currently selected by the player.
    pub selected_unit: Option<u64>,
    pub events: Vec<SimEvent>,
}

/// A unit as the selection / marker layer sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitView {
    pub id: u64,
    pub team: TeamId,
    pub enemy_team: TeamId,
    pub color: Rgb,
    pub state: UnitState,
    pub soldiers_alive: usize,
    pub idle_count: usize,
    pub command_target: DVec3,
    /// Padded hit volume; `None` only transiently for an empty roster.
    pub bounds: Option<Aabb>,
    pub bounds_centroid: DVec3,
    /// Formation slots last dispatched, for target markers.
    pub formation_targets: Vec<DVec3>,
    pub enemy_unit: Option<u64>,
    /// Own centroid → enemy centroid while attacking or seeking.
    pub attack_line: Option<(DVec3, DVec3)>,
    pub is_selected: bool,
}

/// A soldier for rendering and selector highlighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoldierView {
    pub id: u64,
    pub unit: u64,
    pub team: TeamId,
    pub position: DVec3,
    pub velocity: DVec3,
    pub state: SoldierState,
    pub health: f64,
    pub enemy: Option<u64>,
    pub selector: Selector,
}

/// Per-team bookkeeping for the placement UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
    pub color: Rgb,
    pub remaining_units_to_place: u32,
    pub units_alive: usize,
}
