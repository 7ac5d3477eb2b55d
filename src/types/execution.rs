//! Cycle execution types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// States of the per-cycle execution state machine, in order. `phase_reached`
/// on a result records how far the attempt got before exiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ExecutionPhase {
    PendingBalanceCheck,
    ForwardSubmitted,
    ForwardConfirmed,
    ReverseSubmitted,
    ReverseConfirmed,
}

/// The four endings an operator must be able to tell apart: funds never
/// moved, funds moved and came back (at a profit or a loss), or funds are
/// stranded in the intermediate asset and need cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionOutcome {
    Profit,
    Loss,
    NoFundsMoved,
    StuckPosition,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub id: String,
    pub opportunity_id: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Ordered: forward leg first, reverse leg second.
    pub signatures: Vec<String>,
    pub phase_reached: ExecutionPhase,
    pub outcome: ExecutionOutcome,
    pub intermediate_mint: String,
    /// Present iff the attempt ended as a stuck position.
    pub stranded_lamports: Option<u64>,
    /// Realized profit from the actual balance delta, not the quote.
    pub actual_profit_lamports: Option<i64>,
    pub execution_time_ms: u64,
    /// Present iff `success` is false.
    pub error_message: Option<String>,
}

impl ExecutionResult {
    pub fn is_stuck_position(&self) -> bool {
        self.outcome == ExecutionOutcome::StuckPosition
    }
}
