//! Priority fee estimation types

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CongestionLevel {
    Low,      // median under the quiet band
    Medium,
    High,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeeTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// How fast the caller needs inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeeUrgency {
    Low,
    Normal,
    High,
    Critical,
}

/// Whether the operation competes with other searchers for the same
/// opportunity. Competitive strategies never under-bid, even on a quiet
/// network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrategyClass {
    Standard,
    Competitive,
}

/// Six-tier recommendation ladder, anchored to observed percentiles and
/// floored at fixed minimums. Invariant: min ≤ low ≤ medium ≤ high ≤
/// very_high ≤ extreme.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeeLadder {
    pub min: u64,
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub very_high: u64,
    pub extreme: u64,
}

impl FeeLadder {
    pub fn tiers(&self) -> [u64; 6] {
        [
            self.min,
            self.low,
            self.medium,
            self.high,
            self.very_high,
            self.extreme,
        ]
    }

    pub fn is_monotonic(&self) -> bool {
        self.tiers().windows(2).all(|w| w[0] <= w[1])
    }
}

/// Snapshot of network fee conditions. Superseded snapshots are discarded
/// beyond the bounded ring used for trend analysis.
#[derive(Debug, Clone, Serialize)]
pub struct FeeEstimate {
    /// The observed fee values the statistics were derived from, sorted.
    pub sample_window: Vec<u64>,
    pub sample_count: usize,
    pub median_lamports: u64,
    pub p75_lamports: u64,
    pub p90_lamports: u64,
    pub p95_lamports: u64,
    pub trend: FeeTrend,
    pub congestion: CongestionLevel,
    pub ladder: FeeLadder,
    pub recommended_fee_lamports: u64,
    /// Set when no samples were available and the estimate fell back to the
    /// conservative default.
    pub degraded: bool,
    pub computed_at: DateTime<Utc>,
}
