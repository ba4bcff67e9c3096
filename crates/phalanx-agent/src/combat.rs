//! Continuous melee damage model.

use rand::Rng;

use phalanx_core::components::{Health, Weapon};

/// Damage dealt by `weapon` over one tick of length `dt`.
pub fn tick_damage(weapon: &Weapon, dt: f64) -> f64 {
    weapon.damage_per_second * weapon.damage_factor * dt
}

/// Subtract `amount`, never going below zero. Returns true if this hit
/// killed the soldier.
pub fn apply_damage(health: &mut Health, amount: f64) -> bool {
    let was_alive = is_alive(health);
    health.current = (health.current - amount).clamp(0.0, health.max);
    was_alive && !is_alive(health)
}

pub fn is_alive(health: &Health) -> bool {
    health.current > 0.0
}

/// Per-soldier damage multiplier in `[1 - variance, 1 + variance]`.
pub fn draw_damage_factor<R: Rng>(rng: &mut R, variance: f64) -> f64 {
    let variance = variance.abs();
    if variance == 0.0 {
        return 1.0;
    }
    rng.gen_range(1.0 - variance..=1.0 + variance)
}
