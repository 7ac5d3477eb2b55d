//! Rate-governed request scheduling

pub mod request_scheduler;

pub use request_scheduler::*;
