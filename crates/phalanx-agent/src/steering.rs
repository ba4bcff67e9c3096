//! Local steering: reactive repulsion, the slow-down curve and the clamped
//! acceleration model. No global planning happens anywhere in the crate, so
//! a soldier wedged between dense obstacles can stall.

use glam::DVec3;

use phalanx_core::types::flatten;

use crate::profiles::AgentProfile;

/// Sum of pushes away from every point within `radius` of `origin`.
///
/// Each push is the ground unit vector from the neighbor to `origin`, scaled
/// by `strength`. A neighbor sitting exactly on `origin` has no direction and
/// contributes nothing.
pub fn repulsion(
    origin: DVec3,
    neighbors: impl IntoIterator<Item = DVec3>,
    radius: f64,
    strength: f64,
) -> DVec3 {
    let origin = flatten(origin);
    let mut push = DVec3::ZERO;
    for neighbor in neighbors {
        let away = origin - flatten(neighbor);
        let distance = away.length();
        if distance > radius {
            continue;
        }
        push += away.normalize_or_zero() * strength;
    }
    push
}

/// Heading after avoidance: the normalized direction plus the repulsion,
/// renormalized. Zero when the two cancel out.
pub fn steer(direction: DVec3, avoidance: DVec3) -> DVec3 {
    (flatten(direction).normalize_or_zero() + flatten(avoidance)).normalize_or_zero()
}

/// Monotonic ease from `floor` at ratio 0 to 1 at ratio 1 (smoothstep).
/// Out-of-range and NaN ratios are clamped.
pub fn speed_curve(ratio: f64, floor: f64) -> f64 {
    let t = if ratio.is_nan() { 1.0 } else { ratio.clamp(0.0, 1.0) };
    let eased = t * t * (3.0 - 2.0 * t);
    floor + (1.0 - floor) * eased
}

/// Cruise speed far from the target, eased curve at half speed near it.
///
/// The curve is evaluated at `distance / max_distance`; a zero-length leg is
/// treated as ratio 1.
pub fn target_speed(distance: f64, max_distance: f64, profile: &AgentProfile) -> f64 {
    if distance > profile.slow_down_distance {
        return profile.max_speed;
    }
    let ratio = if max_distance > 0.0 {
        distance / max_distance
    } else {
        1.0
    };
    speed_curve(ratio, profile.speed_curve_floor) * profile.max_speed / 2.0
}

/// New velocity after one tick of the clamped acceleration model.
pub fn accelerate(current: DVec3, desired: DVec3, max_change: f64) -> DVec3 {
    current + (desired - current).clamp_length_max(max_change)
}
