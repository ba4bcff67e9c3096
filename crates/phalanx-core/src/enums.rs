//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Local state machine of a single soldier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoldierState {
    /// Holding its formation slot.
    #[default]
    Idle,
    /// Travelling toward its target position.
    Moving,
    /// Charging or fighting a tracked enemy soldier.
    Attacking,
}

/// Aggregate state of a unit, derived from its soldiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// Every soldier is idle.
    #[default]
    Idle,
    /// Soldiers are travelling to their formation slots.
    Moving,
    /// At least one soldier is in melee with the enemy unit.
    Attacking,
    /// Ordered against an enemy unit, closing in but not yet in contact.
    Seeking,
    /// Falling back in formation, holding fire.
    Retreating,
}

/// Kind of order given to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    Move,
    Attack,
    Retreat,
}

/// Battle lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Units are being placed; the simulation does not advance.
    #[default]
    Deployment,
    /// Simulation running.
    Active,
    /// Simulation paused mid-battle.
    Paused,
}

/// How a soldier classifies a neighbor returned by a spatial query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allegiance {
    /// Static obstacle. Avoided, never attacked.
    Obstacle,
    /// Soldier of the same team. Avoided.
    Ally,
    /// Soldier of any other team. Attacked.
    Enemy,
}
