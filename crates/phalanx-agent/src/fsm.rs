//! Soldier behavior finite state machine.
//!
//! Pure functions that compute state transitions and velocity changes for a
//! single soldier from its current state and a snapshot of its surroundings.
//! No ECS dependency: the caller resolves handles and supplies neighbors.

use glam::DVec3;

use phalanx_core::components::Locomotion;
use phalanx_core::enums::{Allegiance, SoldierState};
use phalanx_core::types::flatten;

use crate::profiles::AgentProfile;
use crate::steering;

/// Another entity near the soldier, as returned by the spatial query.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<H> {
    pub handle: H,
    pub position: DVec3,
    pub allegiance: Allegiance,
}

/// The tracked enemy, resolved against the last committed state.
#[derive(Debug, Clone, Copy)]
pub struct Contact<H> {
    pub handle: H,
    pub position: DVec3,
}

/// A state change, reported upward so the unit can keep its counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SoldierState,
    pub to: SoldierState,
}

impl Transition {
    /// Change to the owning unit's idle counter.
    pub fn idle_delta(&self) -> i32 {
        (self.to == SoldierState::Idle) as i32 - (self.from == SoldierState::Idle) as i32
    }

    /// Change to the owning unit's engaged counter.
    pub fn engaged_delta(&self) -> i32 {
        (self.to == SoldierState::Attacking) as i32 - (self.from == SoldierState::Attacking) as i32
    }
}

/// Input to the soldier FSM for a single tick.
pub struct SoldierContext<'a, H> {
    pub state: SoldierState,
    pub position: DVec3,
    pub velocity: DVec3,
    pub locomotion: Locomotion,
    /// Detection disabled (unit retreating).
    pub hold_fire: bool,
    /// Tracked enemy if it is still alive; `None` otherwise.
    pub enemy: Option<Contact<H>>,
    /// Entities within `profile.query_radius()`, in query order, self excluded.
    pub neighbors: &'a [Neighbor<H>],
    pub profile: &'a AgentProfile,
}

/// Output from the soldier FSM.
#[derive(Debug, Clone)]
pub struct SoldierUpdate<H> {
    pub state: SoldierState,
    pub velocity: DVec3,
    pub locomotion: Locomotion,
    pub enemy: Option<H>,
    pub transition: Option<Transition>,
    /// Enemy soldier engaged this tick; the unit must learn whose it is.
    pub engaged: Option<H>,
    /// Combat ended; the unit should hand out a fresh formation slot.
    pub wants_formation: bool,
    /// Enemy soldier in melee contact this tick.
    pub strike: Option<H>,
}

/// Result of asking a soldier to head somewhere new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retarget {
    /// Soldier is attacking; the request is dropped.
    Ignored,
    /// Target accepted, with the Idle → Moving transition if one happened.
    Accepted(Option<Transition>),
}

/// Evaluate the FSM for one soldier.
pub fn evaluate<H: Copy>(ctx: &SoldierContext<'_, H>) -> SoldierUpdate<H> {
    let mut locomotion = ctx.locomotion;
    refresh(&mut locomotion, ctx.position, false);

    match ctx.state {
        SoldierState::Idle => evaluate_idle(ctx, locomotion),
        SoldierState::Moving => evaluate_moving(ctx, locomotion),
        SoldierState::Attacking => evaluate_attacking(ctx, locomotion),
    }
}

/// Point a soldier at a new target. Only honored while Idle or Moving; resets
/// the leg length used by the slow-down curve and forces Moving.
pub fn retarget(
    state: &mut SoldierState,
    locomotion: &mut Locomotion,
    position: DVec3,
    target: DVec3,
) -> Retarget {
    if *state == SoldierState::Attacking {
        return Retarget::Ignored;
    }
    locomotion.target = flatten(target);
    refresh(locomotion, position, true);
    Retarget::Accepted(change_state(state, SoldierState::Moving))
}

/// Drop out of combat (hold-fire orders). Attacking → Moving.
pub fn disengage(state: &mut SoldierState) -> Option<Transition> {
    if *state != SoldierState::Attacking {
        return None;
    }
    change_state(state, SoldierState::Moving)
}

/// Recompute direction and distance to the target; track the leg maximum.
pub fn refresh(locomotion: &mut Locomotion, position: DVec3, force_max_distance: bool) {
    locomotion.direction = flatten(locomotion.target) - flatten(position);
    locomotion.distance = locomotion.direction.length();
    if locomotion.distance > locomotion.max_distance || force_max_distance {
        locomotion.max_distance = locomotion.distance;
    }
}

fn change_state(state: &mut SoldierState, to: SoldierState) -> Option<Transition> {
    if *state == to {
        return None;
    }
    let from = *state;
    *state = to;
    Some(Transition { from, to })
}

fn evaluate_idle<H: Copy>(ctx: &SoldierContext<'_, H>, locomotion: Locomotion) -> SoldierUpdate<H> {
    if let Some(enemy) = detect_enemy(ctx) {
        return engage(ctx, locomotion, enemy);
    }

    // Pushed off the slot: walk back next tick.
    if locomotion.distance > ctx.profile.stop_threshold {
        return SoldierUpdate {
            state: SoldierState::Moving,
            velocity: ctx.velocity,
            locomotion,
            enemy: None,
            transition: Some(Transition {
                from: SoldierState::Idle,
                to: SoldierState::Moving,
            }),
            engaged: None,
            wants_formation: false,
            strike: None,
        };
    }

    settled(locomotion, None)
}

fn evaluate_moving<H: Copy>(ctx: &SoldierContext<'_, H>, locomotion: Locomotion) -> SoldierUpdate<H> {
    if let Some(enemy) = detect_enemy(ctx) {
        return engage(ctx, locomotion, enemy);
    }

    if locomotion.distance <= ctx.profile.stop_threshold {
        return settled(
            locomotion,
            Some(Transition {
                from: SoldierState::Moving,
                to: SoldierState::Idle,
            }),
        );
    }

    let speed = steering::target_speed(locomotion.distance, locomotion.max_distance, ctx.profile);
    SoldierUpdate {
        state: SoldierState::Moving,
        velocity: drive(ctx, locomotion.direction, speed),
        locomotion,
        enemy: None,
        transition: None,
        engaged: None,
        wants_formation: false,
        strike: None,
    }
}

fn evaluate_attacking<H: Copy>(
    ctx: &SoldierContext<'_, H>,
    mut locomotion: Locomotion,
) -> SoldierUpdate<H> {
    let contact = ctx.enemy.filter(|enemy| {
        flatten(enemy.position).distance(flatten(ctx.position)) <= ctx.profile.lose_enemy_distance
    });

    let Some(contact) = contact else {
        return SoldierUpdate {
            state: SoldierState::Moving,
            velocity: ctx.velocity,
            locomotion,
            enemy: None,
            transition: Some(Transition {
                from: SoldierState::Attacking,
                to: SoldierState::Moving,
            }),
            engaged: None,
            wants_formation: true,
            strike: None,
        };
    };

    locomotion.target = flatten(contact.position);
    refresh(&mut locomotion, ctx.position, false);

    // Contact stops dead, like arrival.
    if locomotion.distance <= ctx.profile.distance_to_damage {
        return SoldierUpdate {
            state: SoldierState::Attacking,
            velocity: DVec3::ZERO,
            locomotion,
            enemy: Some(contact.handle),
            transition: None,
            engaged: None,
            wants_formation: false,
            strike: Some(contact.handle),
        };
    }

    SoldierUpdate {
        state: SoldierState::Attacking,
        velocity: drive(ctx, locomotion.direction, ctx.profile.charge_speed),
        locomotion,
        enemy: Some(contact.handle),
        transition: None,
        engaged: None,
        wants_formation: false,
        strike: None,
    }
}

/// First enemy returned by the query within detection range. Deliberately
/// not the nearest one.
fn detect_enemy<H: Copy>(ctx: &SoldierContext<'_, H>) -> Option<H> {
    if ctx.hold_fire {
        return None;
    }
    let origin = flatten(ctx.position);
    ctx.neighbors
        .iter()
        .find(|n| {
            n.allegiance == Allegiance::Enemy
                && flatten(n.position).distance(origin) <= ctx.profile.detect_enemy_distance
        })
        .map(|n| n.handle)
}

fn engage<H: Copy>(ctx: &SoldierContext<'_, H>, locomotion: Locomotion, enemy: H) -> SoldierUpdate<H> {
    SoldierUpdate {
        state: SoldierState::Attacking,
        velocity: ctx.velocity,
        locomotion,
        enemy: Some(enemy),
        transition: Some(Transition {
            from: ctx.state,
            to: SoldierState::Attacking,
        }),
        engaged: Some(enemy),
        wants_formation: false,
        strike: None,
    }
}

/// Arrived: instantaneous stop, no spring back.
fn settled<H>(locomotion: Locomotion, transition: Option<Transition>) -> SoldierUpdate<H> {
    SoldierUpdate {
        state: SoldierState::Idle,
        velocity: DVec3::ZERO,
        locomotion,
        enemy: None,
        transition,
        engaged: None,
        wants_formation: false,
        strike: None,
    }
}

/// Steer toward `direction` around allies and obstacles at `speed`, within
/// the per-tick acceleration budget.
fn drive<H>(ctx: &SoldierContext<'_, H>, direction: DVec3, speed: f64) -> DVec3 {
    let avoid = ctx
        .neighbors
        .iter()
        .filter(|n| matches!(n.allegiance, Allegiance::Obstacle | Allegiance::Ally))
        .map(|n| n.position);
    let avoidance = steering::repulsion(
        ctx.position,
        avoid,
        ctx.profile.avoidance_radius,
        ctx.profile.repulsion_strength(),
    );
    let heading = steering::steer(direction, avoidance);
    steering::accelerate(
        ctx.velocity,
        heading * speed,
        ctx.profile.max_velocity_change_per_tick,
    )
}
