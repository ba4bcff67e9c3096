//! Movement, combat and formation profiles.
//!
//! There is a single soldier archetype; its tuning is consolidated here so
//! scenarios can override individual values without touching the constants.

use serde::{Deserialize, Serialize};

use phalanx_core::constants::*;

/// Per-soldier movement and combat tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    /// Arrival distance (m).
    pub stop_threshold: f64,
    /// Distance below which the soldier eases off (m).
    pub slow_down_distance: f64,
    /// Cruise speed (m/s).
    pub max_speed: f64,
    /// Speed while closing on an enemy (m/s).
    pub charge_speed: f64,
    /// Velocity change allowed per tick (m/s).
    pub max_velocity_change_per_tick: f64,
    /// Floor of the slow-down curve as a fraction of its peak.
    pub speed_curve_floor: f64,
    /// Ally / obstacle repulsion radius (m).
    pub avoidance_radius: f64,
    pub avoidance_force: f64,
    pub avoidance_weight: f64,
    /// Enemy detection radius (m).
    pub detect_enemy_distance: f64,
    /// Range beyond which a tracked enemy is dropped (m).
    pub lose_enemy_distance: f64,
    /// Melee contact distance (m).
    pub distance_to_damage: f64,
    pub max_health: f64,
    pub damage_per_second: f64,
    /// Damage factor is drawn from `1 ± damage_variance`; 0 pins it to 1.
    pub damage_variance: f64,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            stop_threshold: STOP_THRESHOLD,
            slow_down_distance: SLOW_DOWN_DISTANCE,
            max_speed: MAX_SPEED,
            charge_speed: CHARGE_SPEED,
            max_velocity_change_per_tick: MAX_VELOCITY_CHANGE_PER_TICK,
            speed_curve_floor: SPEED_CURVE_FLOOR,
            avoidance_radius: AVOIDANCE_RADIUS,
            avoidance_force: AVOIDANCE_FORCE,
            avoidance_weight: AVOIDANCE_WEIGHT,
            detect_enemy_distance: DETECT_ENEMY_DISTANCE,
            lose_enemy_distance: LOSE_ENEMY_DISTANCE,
            distance_to_damage: DISTANCE_TO_DAMAGE,
            max_health: SOLDIER_MAX_HEALTH,
            damage_per_second: DAMAGE_PER_SECOND,
            damage_variance: DAMAGE_VARIANCE,
        }
    }
}

impl AgentProfile {
    /// Magnitude of a single neighbor's push.
    pub fn repulsion_strength(&self) -> f64 {
        self.avoidance_force * self.avoidance_weight
    }

    /// Widest radius a soldier queries in one tick.
    pub fn query_radius(&self) -> f64 {
        self.detect_enemy_distance.max(self.avoidance_radius)
    }
}

/// Unit roster and formation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitProfile {
    pub soldiers: usize,
    pub rows: usize,
    pub row_spacing: f64,
    pub col_spacing: f64,
    pub bounds_padding: f64,
}

impl Default for UnitProfile {
    fn default() -> Self {
        Self {
            soldiers: UNIT_SOLDIER_COUNT,
            rows: UNIT_ROWS,
            row_spacing: ROW_SPACING,
            col_spacing: COL_SPACING,
            bounds_padding: BOUNDS_PADDING,
        }
    }
}
