//! Simulation engine for PHALANX.
//!
//! Owns the hecs ECS world, the spatial index and the unit controllers,
//! runs the soldier and unit systems at a fixed tick rate, and produces
//! `BattleSnapshot`s for the UI layer.

pub mod components;
pub mod engine;
pub mod error;
pub mod selection;
pub mod spatial;
pub mod systems;
pub mod unit;
pub mod world_setup;

pub use engine::{SimConfig, SimulationEngine};
pub use error::SimError;
pub use phalanx_core as core;

#[cfg(test)]
mod tests;
