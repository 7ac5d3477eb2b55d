//! Priority fee estimation and bidding recommendations

pub mod estimator;

pub use estimator::*;
