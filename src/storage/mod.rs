//! Bounded in-memory trade history

pub mod history;

pub use history::*;
