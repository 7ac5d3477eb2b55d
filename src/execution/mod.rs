//! Cycle execution engine and the simulated ledger

pub mod engine;
pub mod simulation;

pub use engine::*;
pub use simulation::*;
