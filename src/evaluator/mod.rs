//! Cycle pricing and opportunity construction

pub mod quote_chain;
pub mod scoring;

pub use quote_chain::*;
pub use scoring::*;
