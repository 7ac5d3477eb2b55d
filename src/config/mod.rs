//! Configuration management for the cycle bot
//!
//! Loaded once in `main` and passed down explicitly; components never reach
//! for a process-wide singleton.

pub mod settings;

pub use settings::*;
