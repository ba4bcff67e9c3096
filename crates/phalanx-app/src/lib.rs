//! PHALANX headless runner.
//!
//! Loads a battle scenario, drives the simulation engine at the fixed tick
//! rate and reports how the battle ended.

pub mod game_loop;
pub mod logging;
pub mod scenario;

pub use phalanx_core as core;
