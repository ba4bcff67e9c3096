//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Game logic lives in the agent crate and the sim systems, not here.
//! Components that hold entity handles live in `phalanx-sim`.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Where a soldier is heading and how far it still has to go.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Locomotion {
    /// Desired destination on the ground plane.
    pub target: DVec3,
    /// Ground vector from the soldier to `target`, refreshed every tick.
    pub direction: DVec3,
    /// Length of `direction`.
    pub distance: f64,
    /// Longest distance seen on the current leg. Normalizes the slow-down
    /// curve; reset whenever a new target is forced.
    pub max_distance: f64,
}

/// Hit points of a soldier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: f64,
    pub max: f64,
}

/// Melee output of a soldier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weapon {
    pub damage_per_second: f64,
    /// Per-soldier multiplier drawn once at spawn.
    pub damage_factor: f64,
}

/// Selection marker under a soldier, mirrored to the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    /// Marker drawn at all (hovered or selected).
    pub visible: bool,
    /// Marker drawn at full brightness (unit selected).
    pub emphasized: bool,
}

/// Marks an entity as a static obstacle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Obstacle;
