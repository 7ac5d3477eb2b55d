//! Cycle Arbitrage Bot - Round-trip arbitrage on swap aggregators
//!
//! This bot enumerates short round-trip swap cycles (base asset → intermediate
//! token(s) → base asset), prices them hop by hop through an aggregator quote
//! API under a strict request-rate budget, and executes profitable cycles as a
//! forward and a reverse swap with confirmation polling and balance
//! verification. By default it paper-trades against a simulated ledger.

pub mod config;
pub mod types;
pub mod errors;
pub mod network;
pub mod scheduler;
pub mod fees;
pub mod cycles;
pub mod evaluator;
pub mod execution;
pub mod storage;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use errors::{BotError, BotResult};
pub use types::*;
