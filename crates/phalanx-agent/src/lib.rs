//! Agent decision logic for PHALANX.
//!
//! Soldier state machine, local steering, formation layout, unit
//! aggregation policy, and the melee damage model. Everything here is a
//! pure function over plain data; the sim crate feeds it from the ECS.

pub mod aggregate;
pub mod combat;
pub mod formation;
pub mod fsm;
pub mod profiles;
pub mod steering;

pub use phalanx_core as core;
