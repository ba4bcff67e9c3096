//! Unit aggregate state policy.
//!
//! The sim keeps a unit's counters up to date from soldier transitions; this
//! module decides, once per tick and after every soldier has committed, what
//! the unit as a whole is doing.

use phalanx_core::enums::UnitState;

/// Committed counters and flags of one unit for this tick.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext {
    pub state: UnitState,
    pub roster_len: usize,
    pub idle_count: usize,
    /// Soldiers currently in `Attacking`.
    pub engaged_count: usize,
    /// A soldier reported a new engagement this tick.
    pub engagement_reported: bool,
    /// The tracked enemy unit still exists.
    pub enemy_alive: bool,
}

/// Outcome of one aggregation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitUpdate {
    pub state: UnitState,
    /// The enemy unit is gone: forget it and hold at the current centroid.
    pub enemy_lost: bool,
}

/// Decide the unit's aggregate state.
pub fn evaluate(ctx: &UnitContext) -> UnitUpdate {
    let mut state = ctx.state;
    let mut enemy_lost = false;

    if ctx.roster_len == 0 {
        return UnitUpdate { state, enemy_lost };
    }

    // Retreating units ignore contact reports; their soldiers hold fire.
    if ctx.engagement_reported
        && matches!(state, UnitState::Idle | UnitState::Moving | UnitState::Seeking)
    {
        state = UnitState::Attacking;
    }

    if matches!(state, UnitState::Attacking | UnitState::Seeking) && !ctx.enemy_alive {
        state = UnitState::Moving;
        enemy_lost = true;
    }

    if state != UnitState::Idle && ctx.idle_count >= ctx.roster_len {
        state = UnitState::Idle;
    } else if state == UnitState::Idle && ctx.idle_count < ctx.roster_len {
        state = UnitState::Moving;
    }

    state = match state {
        UnitState::Attacking if ctx.engaged_count == 0 => UnitState::Seeking,
        UnitState::Seeking if ctx.engaged_count > 0 => UnitState::Attacking,
        other => other,
    };

    UnitUpdate { state, enemy_lost }
}

/// Whether the unit follows the enemy centroid this tick.
pub fn tracks_enemy(state: UnitState) -> bool {
    matches!(state, UnitState::Attacking | UnitState::Seeking)
}
