//! Simulation constants and tuning parameters.
//!
//! Distances are meters on the ground plane, speeds meters per second.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 50;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Motion ---

/// Distance to target at or below which a soldier counts as arrived.
pub const STOP_THRESHOLD: f64 = 0.05;

/// Distance to target below which soldiers ease off along the speed curve.
pub const SLOW_DOWN_DISTANCE: f64 = 5.0;

/// Cruise speed of a moving soldier.
pub const MAX_SPEED: f64 = 3.0;

/// Speed of a soldier closing on its tracked enemy.
pub const CHARGE_SPEED: f64 = 3.5;

/// Largest velocity change a soldier may apply in a single tick.
/// 0.07 m/s per tick at 50 Hz is 3.5 m/s².
pub const MAX_VELOCITY_CHANGE_PER_TICK: f64 = 0.07;

/// Floor of the slow-down curve as a fraction of its peak, so the last
/// centimeters are still covered in finite time.
pub const SPEED_CURVE_FLOOR: f64 = 0.1;

// --- Avoidance ---

/// Radius inside which allies and obstacles push a moving soldier away.
/// Kept under the formation spacing so a settled formation exerts no push.
pub const AVOIDANCE_RADIUS: f64 = 1.5;

/// Raw repulsion strength per neighbor.
pub const AVOIDANCE_FORCE: f64 = 10.0;

/// Blend weight applied to each repulsion before it joins the heading.
pub const AVOIDANCE_WEIGHT: f64 = 0.1;

// --- Combat ---

/// Radius inside which a soldier notices an enemy soldier.
pub const DETECT_ENEMY_DISTANCE: f64 = 8.0;

/// Beyond this range a tracked enemy is considered lost.
pub const LOSE_ENEMY_DISTANCE: f64 = 16.0;

/// Center-to-center distance at which two soldiers are in melee contact.
pub const DISTANCE_TO_DAMAGE: f64 = 1.2;

/// Starting (and maximum) soldier health.
pub const SOLDIER_MAX_HEALTH: f64 = 100.0;

/// Base melee damage per second.
pub const DAMAGE_PER_SECOND: f64 = 10.0;

/// Half-width of the per-soldier damage factor band (factor in 1 ± variance).
pub const DAMAGE_VARIANCE: f64 = 0.2;

// --- Units ---

/// Soldiers spawned per unit.
pub const UNIT_SOLDIER_COUNT: usize = 12;

/// Formation rows per unit.
pub const UNIT_ROWS: usize = 3;

/// Spacing between formation rows.
pub const ROW_SPACING: f64 = 2.0;

/// Spacing between formation columns.
pub const COL_SPACING: f64 = 2.0;

/// Padding added to the unit bounding box on the ground plane.
pub const BOUNDS_PADDING: f64 = 2.0;

/// Vertical thickness of the unit bounding box.
pub const BOUNDS_HEIGHT: f64 = 0.01;

/// Minimum movement of the enemy centroid before formation targets are re-sent.
pub const RETARGET_EPSILON: f64 = 0.01;

/// Units each team may place per battle.
pub const UNITS_PER_TEAM: u32 = 5;

// --- Spatial index ---

/// Edge length of a spatial index cell.
pub const SPATIAL_CELL_SIZE: f64 = 4.0;

// --- Time scale ---

/// Upper bound accepted by `SetTimeScale`.
pub const MAX_TIME_SCALE: f64 = 4.0;
