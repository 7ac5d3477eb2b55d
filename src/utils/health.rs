//! Health snapshot assembly

use std::time::Instant;
use crate::errors::CircuitBreaker;
use crate::fees::FeeEstimator;
use crate::scheduler::RequestScheduler;
use crate::types::HealthStatus;

pub async fn run_health_check(
    scheduler: &RequestScheduler,
    fees: &FeeEstimator,
    circuit_breaker: &CircuitBreaker,
    start_time: Instant,
) -> HealthStatus {
    let utilization = scheduler.utilization().await;
    let latest_estimate = fees.latest().await;

    HealthStatus {
        scheduler_queue_depth: utilization.queue_depth,
        scheduler_minute_utilization: utilization.minute_utilization,
        fee_estimate_degraded: latest_estimate.map(|e| e.degraded).unwrap_or(true),
        fee_estimate_age_secs: fees.estimate_age_secs().await,
        consecutive_errors: *circuit_breaker.consecutive_errors.read().await,
        circuit_breaker_active: *circuit_breaker.is_open.read().await,
        uptime_seconds: start_time.elapsed().as_secs(),
    }
}
