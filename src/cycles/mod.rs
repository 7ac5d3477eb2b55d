//! Round-trip cycle generation

pub mod generator;

pub use generator::*;
