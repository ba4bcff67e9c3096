//! Player commands sent from the input layer to the simulation.
//!
//! Commands are queued and processed at the next tick boundary. Units are
//! addressed by the opaque ids carried in snapshots.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::CommandKind;

/// All possible player actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Orders ---
    /// Order a unit to move, attack or retreat.
    Order {
        unit: u64,
        kind: CommandKind,
        position: DVec3,
        /// Enemy unit to attack, for `CommandKind::Attack`.
        #[serde(default)]
        enemy: Option<u64>,
    },

    // --- Selection ---
    /// Mouse entered or left a unit's bounds.
    HoverUnit { unit: u64, hovered: bool },
    /// Select a unit (deselects the previous one).
    SelectUnit { unit: u64 },
    /// Click on empty ground: drop the current selection.
    ClearSelection,

    // --- Simulation control ---
    /// Leave deployment and start the battle.
    Fight,
    /// Pause the simulation.
    Pause,
    /// Resume the simulation.
    Resume,
    /// Clear the battlefield and return to deployment.
    Reset,
    /// Set time scale (1.0 = normal, 2.0 = double, 0.0 holds the world still).
    SetTimeScale { scale: f64 },
}
