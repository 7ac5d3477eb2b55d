//! Priority fee estimator
//!
//! Samples recently observed priority fees, classifies congestion from the
//! median, and derives a six-tier bidding ladder anchored to the empirical
//! percentiles but floored so recommendations never collapse to zero on a
//! quiet network. Fee analysis must never block trading: with no samples the
//! estimator degrades to a conservative default instead of failing.

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use crate::network::interfaces::FeeSampleSource;
use crate::types::{CongestionLevel, FeeEstimate, FeeLadder, FeeTrend, FeeUrgency, StrategyClass};

// Congestion bands, thresholded on the sample median (lamports).
const QUIET_MEDIAN_CEILING: u64 = 10_000;
const MEDIUM_MEDIAN_CEILING: u64 = 100_000;
const HIGH_MEDIAN_CEILING: u64 = 1_000_000;

// Ladder floors. Empirical percentiles can only raise a tier above these.
const FLOOR_MIN: u64 = 1_000;
const FLOOR_LOW: u64 = 5_000;
const FLOOR_MEDIUM: u64 = 10_000;
const FLOOR_HIGH: u64 = 50_000;
const FLOOR_VERY_HIGH: u64 = 100_000;
const FLOOR_EXTREME: u64 = 200_000;

/// Bid when the estimator has nothing to go on. Deliberately on the high
/// side: over-bidding slightly beats losing a cycle to under-inclusion.
pub const DEGRADED_DEFAULT_FEE_LAMPORTS: u64 = 100_000;

// Trend hysteresis against the previous snapshot's median.
const TREND_UP_RATIO: f64 = 1.1;
const TREND_DOWN_RATIO: f64 = 0.9;

const SNAPSHOT_RING_CAPACITY: usize = 10;

pub struct FeeEstimator {
    source: Arc<dyn FeeSampleSource>,
    snapshots: RwLock<VecDeque<FeeEstimate>>,
}

impl FeeEstimator {
    pub fn new(source: Arc<dyn FeeSampleSource>) -> Self {
        Self {
            source,
            snapshots: RwLock::new(VecDeque::with_capacity(SNAPSHOT_RING_CAPACITY)),
        }
    }

    /// Takes a fresh sample and recomputes the estimate. Failure to sample is
    /// not an error: the result degrades to the conservative default.
    pub async fn analyze(&self) -> FeeEstimate {
        let samples = match self.source.recent_priority_fees().await {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Fee sample fetch failed, degrading estimate: {}", e);
                Vec::new()
            }
        };

        let previous_median = self
            .snapshots
            .read()
            .await
            .back()
            .map(|s| s.median_lamports);

        let estimate = build_estimate(&samples, previous_median);

        debug!(
            samples = estimate.sample_count,
            median = estimate.median_lamports,
            congestion = ?estimate.congestion,
            recommended = estimate.recommended_fee_lamports,
            degraded = estimate.degraded,
            "Fee estimate refreshed"
        );

        let mut ring = self.snapshots.write().await;
        if ring.len() == SNAPSHOT_RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(estimate.clone());
        estimate
    }

    /// Last computed estimate without re-sampling.
    pub async fn latest(&self) -> Option<FeeEstimate> {
        self.snapshots.read().await.back().cloned()
    }

    /// Fee to bid for an operation of the given urgency and strategy class.
    /// Starts from the congestion tier, raises for urgency, and raises to at
    /// least `high` for competitive strategies: a contention-prone cycle must
    /// not under-bid just because the network looks quiet.
    pub async fn recommend(&self, urgency: FeeUrgency, class: StrategyClass) -> u64 {
        let estimate = match self.latest().await {
            Some(estimate) => estimate,
            None => build_estimate(&[], None),
        };

        let tiers = estimate.ladder.tiers();
        let base_index = congestion_tier_index(estimate.congestion);
        let adjusted = match urgency {
            FeeUrgency::Low => base_index.saturating_sub(1),
            FeeUrgency::Normal => base_index,
            FeeUrgency::High => base_index + 1,
            FeeUrgency::Critical => base_index + 2,
        };
        let mut index = adjusted.min(tiers.len() - 1);

        if class == StrategyClass::Competitive {
            // tiers[3] is `high`.
            index = index.max(3);
        }

        tiers[index]
    }

    /// Age of the latest snapshot, for health reporting.
    pub async fn estimate_age_secs(&self) -> Option<u64> {
        self.latest()
            .await
            .map(|e| (Utc::now() - e.computed_at).num_seconds().max(0) as u64)
    }
}

fn congestion_tier_index(congestion: CongestionLevel) -> usize {
    // Indexes into FeeLadder::tiers(): [min, low, medium, high, very_high, extreme]
    match congestion {
        CongestionLevel::Low => 1,
        CongestionLevel::Medium => 2,
        CongestionLevel::High => 3,
        CongestionLevel::Extreme => 5,
    }
}

fn build_estimate(samples: &[u64], previous_median: Option<u64>) -> FeeEstimate {
    if samples.is_empty() {
        let ladder = derive_ladder(
            DEGRADED_DEFAULT_FEE_LAMPORTS / 2,
            DEGRADED_DEFAULT_FEE_LAMPORTS,
            DEGRADED_DEFAULT_FEE_LAMPORTS,
            DEGRADED_DEFAULT_FEE_LAMPORTS,
        );
        return FeeEstimate {
            sample_window: Vec::new(),
            sample_count: 0,
            median_lamports: 0,
            p75_lamports: 0,
            p90_lamports: 0,
            p95_lamports: 0,
            trend: FeeTrend::Stable,
            congestion: CongestionLevel::Medium,
            ladder,
            recommended_fee_lamports: DEGRADED_DEFAULT_FEE_LAMPORTS,
            degraded: true,
            computed_at: Utc::now(),
        };
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let median = percentile(&sorted, 50);
    let p75 = percentile(&sorted, 75);
    let p90 = percentile(&sorted, 90);
    let p95 = percentile(&sorted, 95);

    let congestion = classify_congestion(median);
    let ladder = derive_ladder(median, p75, p90, p95);
    let recommended = ladder.tiers()[congestion_tier_index(congestion)];

    let trend = match previous_median {
        Some(prev) if prev > 0 => {
            let ratio = median as f64 / prev as f64;
            if ratio > TREND_UP_RATIO {
                FeeTrend::Increasing
            } else if ratio < TREND_DOWN_RATIO {
                FeeTrend::Decreasing
            } else {
                FeeTrend::Stable
            }
        }
        Some(_) if median > 0 => FeeTrend::Increasing,
        _ => FeeTrend::Stable,
    };

    FeeEstimate {
        sample_count: samples.len(),
        sample_window: sorted,
        median_lamports: median,
        p75_lamports: p75,
        p90_lamports: p90,
        p95_lamports: p95,
        trend,
        congestion,
        ladder,
        recommended_fee_lamports: recommended,
        degraded: false,
        computed_at: Utc::now(),
    }
}

fn classify_congestion(median: u64) -> CongestionLevel {
    match median {
        m if m < QUIET_MEDIAN_CEILING => CongestionLevel::Low,
        m if m < MEDIUM_MEDIAN_CEILING => CongestionLevel::Medium,
        m if m < HIGH_MEDIAN_CEILING => CongestionLevel::High,
        _ => CongestionLevel::Extreme,
    }
}

/// Percentile-anchored ladder with fixed floors, forced monotonic.
fn derive_ladder(median: u64, p75: u64, p90: u64, p95: u64) -> FeeLadder {
    let raw = [
        FLOOR_MIN.max(median / 2),
        FLOOR_LOW.max(median),
        FLOOR_MEDIUM.max(p75),
        FLOOR_HIGH.max(p90),
        FLOOR_VERY_HIGH.max(p95),
        FLOOR_EXTREME.max(p95.saturating_mul(2)),
    ];

    let mut tiers = raw;
    for i in 1..tiers.len() {
        tiers[i] = tiers[i].max(tiers[i - 1]);
    }

    FeeLadder {
        min: tiers[0],
        low: tiers[1],
        medium: tiers[2],
        high: tiers[3],
        very_high: tiers[4],
        extreme: tiers[5],
    }
}

/// Nearest-rank percentile over a sorted slice.
fn percentile(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let index = (sorted.len() - 1) * pct / 100;
    sorted[index]
}
