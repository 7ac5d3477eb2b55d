//! Capped history of accepted opportunities and execution attempts
//!
//! Display-oriented only. The newest entries win; nothing is persisted.

use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::info;
use crate::types::{ExecutionOutcome, ExecutionResult, Opportunity};

const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub opportunities_seen: u64,
    pub executions_attempted: u64,
    pub executions_succeeded: u64,
    pub stuck_positions: u64,
    pub realized_profit_lamports: i64,
}

pub struct TradeHistory {
    capacity: usize,
    opportunities: Mutex<VecDeque<Opportunity>>,
    executions: Mutex<VecDeque<ExecutionResult>>,
    summary: Mutex<SessionSummary>,
}

impl TradeHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            opportunities: Mutex::new(VecDeque::new()),
            executions: Mutex::new(VecDeque::new()),
            summary: Mutex::new(SessionSummary::default()),
        }
    }

    pub async fn record_opportunity(&self, opportunity: &Opportunity) {
        info!(
            opportunity_id = %opportunity.id,
            route = %opportunity.route_display(),
            net_profit = opportunity.net_profit_lamports,
            confidence = opportunity.confidence,
            "Recorded opportunity"
        );

        let mut list = self.opportunities.lock().await;
        if list.len() == self.capacity {
            list.pop_front();
        }
        list.push_back(opportunity.clone());
        self.summary.lock().await.opportunities_seen += 1;
    }

    pub async fn record_execution(&self, execution: &ExecutionResult) {
        info!(
            execution_id = %execution.id,
            outcome = ?execution.outcome,
            actual_profit = ?execution.actual_profit_lamports,
            "Recorded execution"
        );

        let mut list = self.executions.lock().await;
        if list.len() == self.capacity {
            list.pop_front();
        }
        list.push_back(execution.clone());

        let mut summary = self.summary.lock().await;
        summary.executions_attempted += 1;
        if execution.success {
            summary.executions_succeeded += 1;
        }
        if execution.outcome == ExecutionOutcome::StuckPosition {
            summary.stuck_positions += 1;
        }
        if let Some(profit) = execution.actual_profit_lamports {
            summary.realized_profit_lamports += profit;
        }
    }

    pub async fn recent_opportunities(&self, limit: usize) -> Vec<Opportunity> {
        let list = self.opportunities.lock().await;
        list.iter().rev().take(limit).cloned().collect()
    }

    pub async fn recent_executions(&self, limit: usize) -> Vec<ExecutionResult> {
        let list = self.executions.lock().await;
        list.iter().rev().take(limit).cloned().collect()
    }

    pub async fn summary(&self) -> SessionSummary {
        self.summary.lock().await.clone()
    }
}

impl Default for TradeHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use crate::types::tokens::{SOL, TOKEN_UNIVERSE, find_token};
    use crate::types::{ExecutionPhase, RiskLevel};

    fn opportunity(id: &str) -> Opportunity {
        let usdc = find_token(&TOKEN_UNIVERSE, "USDC").unwrap().clone();
        let now = Utc::now();
        Opportunity {
            id: id.to_string(),
            path: vec![SOL, usdc, SOL],
            legs: vec![],
            input_lamports: 1_000_000_000,
            expected_return_lamports: 1_010_000_000,
            gross_profit_lamports: 10_000_000,
            estimated_cost_lamports: 1_000_000,
            net_profit_lamports: 9_000_000,
            net_profit_usd: dec!(1.35),
            confidence: 0.6,
            risk_level: RiskLevel::Low,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(15),
        }
    }

    fn execution(outcome: ExecutionOutcome, profit: Option<i64>) -> ExecutionResult {
        ExecutionResult {
            id: "ex".to_string(),
            opportunity_id: "opp".to_string(),
            timestamp: Utc::now(),
            success: matches!(outcome, ExecutionOutcome::Profit | ExecutionOutcome::Loss),
            signatures: vec![],
            phase_reached: ExecutionPhase::ReverseConfirmed,
            outcome,
            intermediate_mint: "mint".to_string(),
            stranded_lamports: None,
            actual_profit_lamports: profit,
            execution_time_ms: 10,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn history_is_bounded_newest_first() {
        let history = TradeHistory::new(3);
        for i in 0..5 {
            history.record_opportunity(&opportunity(&i.to_string())).await;
        }

        let recent = history.recent_opportunities(10).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].id, "4");
        assert_eq!(recent[2].id, "2");
        assert_eq!(history.summary().await.opportunities_seen, 5);
    }

    #[tokio::test]
    async fn summary_tracks_outcomes_and_realized_profit() {
        let history = TradeHistory::default();
        history
            .record_execution(&execution(ExecutionOutcome::Profit, Some(5_000_000)))
            .await;
        history
            .record_execution(&execution(ExecutionOutcome::Loss, Some(-2_000_000)))
            .await;
        history
            .record_execution(&execution(ExecutionOutcome::StuckPosition, None))
            .await;

        let summary = history.summary().await;
        assert_eq!(summary.executions_attempted, 3);
        assert_eq!(summary.executions_succeeded, 2);
        assert_eq!(summary.stuck_positions, 1);
        assert_eq!(summary.realized_profit_lamports, 3_000_000);
    }
}
