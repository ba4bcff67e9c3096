//! Construction-time faults.
//!
//! Nothing inside the tick loop is fatal; everything that could leave a unit
//! half-built is rejected here, before it is spawned.

use thiserror::Error;

use phalanx_core::types::TeamId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("a unit needs at least one soldier")]
    EmptyRoster,

    #[error("a formation needs at least one row")]
    NoRows,

    #[error("team {0:?} cannot be its own enemy")]
    SameTeam(TeamId),

    #[error("unknown team {0:?}")]
    UnknownTeam(TeamId),

    #[error("team {0:?} has no units left to place")]
    NoUnitsRemaining(TeamId),

    #[error("units can only be placed during deployment")]
    NotDeploying,
}
