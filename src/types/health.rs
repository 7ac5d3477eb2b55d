//! Health monitoring types

#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub scheduler_queue_depth: usize,
    pub scheduler_minute_utilization: f64,
    pub fee_estimate_degraded: bool,
    pub fee_estimate_age_secs: Option<u64>,
    pub consecutive_errors: u32,
    pub circuit_breaker_active: bool,
    pub uptime_seconds: u64,
}
