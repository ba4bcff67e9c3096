//! Events emitted by the simulation for UI bookkeeping.

use serde::{Deserialize, Serialize};

use crate::enums::{GamePhase, UnitState};
use crate::types::TeamId;

/// Notifications drained into each snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// A unit was placed on the battlefield.
    UnitSpawned { unit: u64, team: TeamId },
    /// A unit's aggregate state changed.
    UnitStateChanged {
        unit: u64,
        from: UnitState,
        to: UnitState,
    },
    /// A soldier of `unit` made first contact with a soldier of `enemy_unit`.
    Engaged { unit: u64, enemy_unit: u64 },
    /// A soldier died and left its unit's roster.
    SoldierKilled { soldier: u64, unit: u64 },
    /// The last soldier of a unit died; the unit is gone.
    UnitDestroyed { unit: u64, team: TeamId },
    /// The battle phase changed.
    PhaseChanged { from: GamePhase, to: GamePhase },
}
