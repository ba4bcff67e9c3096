//! Components that hold entity handles.
//!
//! Back-references are generational `hecs::Entity` handles: once the referent
//! is despawned, `World::contains` reports false and the link reads as none.

use glam::DVec3;
use hecs::Entity;

use phalanx_agent::profiles::UnitProfile;
use phalanx_core::enums::{SoldierState, UnitState};
use phalanx_core::types::{Aabb, Rgb, TeamId};

/// Leaf agent. Spawned together with `Position`, `Velocity`, `Locomotion`,
/// `Health`, `Weapon` and `Selector`.
#[derive(Debug, Clone)]
pub struct SoldierAgent {
    /// Owning unit (non-owning link).
    pub unit: Entity,
    pub team: TeamId,
    pub state: SoldierState,
    /// Enemy soldier currently engaged. Cleared with the transition out of
    /// `Attacking`.
    pub enemy: Option<Entity>,
}

/// Parent controller of a fixed roster of soldiers.
#[derive(Debug, Clone)]
pub struct UnitController {
    pub team: TeamId,
    pub enemy_team: TeamId,
    pub color: Rgb,
    /// Live soldiers in spawn order.
    pub roster: Vec<Entity>,
    /// Layout fixed at spawn.
    pub layout: UnitProfile,
    pub state: UnitState,
    /// Roster members currently `Idle`. Maintained from transitions only.
    pub idle_count: usize,
    /// Roster members currently `Attacking`. Maintained from transitions only.
    pub engaged_count: usize,
    pub command_target: DVec3,
    /// Enemy unit being attacked or sought.
    pub enemy_unit: Option<Entity>,
    /// Enemy centroid the formation was last dispatched toward.
    pub enemy_aim: Option<DVec3>,
    pub bounds: Option<Aabb>,
    pub bounds_centroid: DVec3,
    /// Formation slots last dispatched, in roster order.
    pub formation_targets: Vec<DVec3>,
    /// Soldiers skip enemy detection (retreat order).
    pub hold_fire: bool,
    pub selected: bool,
    pub hovered: bool,
}

impl UnitController {
    pub fn new(team: TeamId, enemy_team: TeamId, color: Rgb, layout: UnitProfile) -> Self {
        Self {
            team,
            enemy_team,
            color,
            roster: Vec::with_capacity(layout.soldiers),
            layout,
            state: UnitState::Idle,
            idle_count: 0,
            engaged_count: 0,
            command_target: DVec3::ZERO,
            enemy_unit: None,
            enemy_aim: None,
            bounds: None,
            bounds_centroid: DVec3::ZERO,
            formation_targets: Vec::new(),
            hold_fire: false,
            selected: false,
            hovered: false,
        }
    }
}
