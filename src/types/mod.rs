//! Core data types and structures

pub mod tokens;
pub mod opportunity;
pub mod fees;
pub mod execution;
pub mod health;

pub use tokens::*;
pub use opportunity::*;
pub use fees::*;
pub use execution::*;
pub use health::*;
