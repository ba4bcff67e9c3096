//! Combat system: commits buffered melee strikes.
//!
//! Runs after every soldier has been evaluated, so a soldier killed this
//! tick still dealt its own damage.

use hecs::World;
use tracing::trace;

use phalanx_agent::combat::apply_damage;
use phalanx_core::components::Health;

use super::soldier::Strike;
use crate::unit::entity_id;

/// Apply every strike. Damage is continuous and health never drops below
/// zero; dead soldiers are removed by the cleanup system.
pub fn run(world: &mut World, strikes: &mut Vec<Strike>) {
    for strike in strikes.drain(..) {
        let Ok(mut health) = world.get::<&mut Health>(strike.target) else {
            continue;
        };
        if apply_damage(&mut health, strike.amount) {
            trace!(
                attacker = entity_id(strike.attacker),
                target = entity_id(strike.target),
                "killing blow"
            );
        }
    }
}
