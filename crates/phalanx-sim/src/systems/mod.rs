//! ECS systems that operate on the simulation world each tick.
//!
//! Systems are plain functions over `&mut World` (or `&World` for read-only)
//! plus the per-tick buffers they exchange. They run in the order listed in
//! `SimulationEngine::run_systems`.

pub mod aggregate;
pub mod cleanup;
pub mod combat;
pub mod movement;
pub mod snapshot;
pub mod soldier;
