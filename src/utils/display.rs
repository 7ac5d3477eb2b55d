//! Display and printing utilities

use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};
use crate::errors::CircuitBreaker;
use crate::storage::SessionSummary;
use crate::types::{ExecutionOutcome, ExecutionResult, FeeEstimate, Opportunity};
use crate::utils::math::lamports_to_sol;

pub async fn print_session_stats(
    start_time: Instant,
    summary: &SessionSummary,
    scan_batches: u64,
    error_counts: &HashMap<String, u32>,
    circuit_breaker: &CircuitBreaker,
) {
    let runtime = start_time.elapsed().as_secs() / 60;

    info!("\n📊 Session Statistics ({} minutes)", runtime);
    info!("   🔍 SCANNING:");
    info!("     Scan batches completed: {}", scan_batches);
    info!("     Opportunities accepted: {}", summary.opportunities_seen);
    info!("   🚀 EXECUTION:");
    info!("     Attempts: {}", summary.executions_attempted);
    info!("     Succeeded: {}", summary.executions_succeeded);
    info!("     Success rate: {:.1}%",
        if summary.executions_attempted > 0 {
            (summary.executions_succeeded as f64 / summary.executions_attempted as f64) * 100.0
        } else {
            0.0
        }
    );
    info!("     Stuck positions: {}", summary.stuck_positions);
    info!("     Realized profit: {} SOL", lamports_to_sol(summary.realized_profit_lamports));

    info!("   ⚙️  SYSTEM:");
    info!("     Circuit breaker: {}",
        if *circuit_breaker.is_open.read().await { "OPEN" } else { "CLOSED" }
    );

    if !error_counts.is_empty() {
        info!("     Error summary:");
        for (error_type, count) in error_counts.iter() {
            info!("       {}: {}", error_type, count);
        }
    }

    info!("");
}

pub fn print_opportunity(opportunity: &Opportunity) {
    warn!("\n🎯 CYCLE OPPORTUNITY #{}", opportunity.id);
    warn!("📍 Route: {}", opportunity.route_display());
    warn!("💰 Profit Analysis:");
    warn!("   Input:     {} SOL", lamports_to_sol(opportunity.input_lamports as i64));
    warn!("   Expected:  {} SOL", lamports_to_sol(opportunity.expected_return_lamports as i64));
    warn!("   Gross:     {} SOL", lamports_to_sol(opportunity.gross_profit_lamports));
    warn!("   Est. cost: {} SOL", lamports_to_sol(opportunity.estimated_cost_lamports as i64));
    warn!(
        "   Net:       {} SOL (${:.2})",
        lamports_to_sol(opportunity.net_profit_lamports),
        opportunity.net_profit_usd
    );
    warn!("📊 Confidence: {:.2} | Risk: {:?} | Hops: {}",
        opportunity.confidence,
        opportunity.risk_level,
        opportunity.hop_count()
    );
}

pub fn print_execution_result(execution: &ExecutionResult) {
    match execution.outcome {
        ExecutionOutcome::Profit | ExecutionOutcome::Loss => {
            warn!("\n✅ CYCLE EXECUTION #{}", execution.id);
            warn!("   Outcome: {:?}", execution.outcome);
            for (index, signature) in execution.signatures.iter().enumerate() {
                let leg = if index == 0 { "forward" } else { "reverse" };
                warn!("   {} signature: {}", leg, signature);
            }
            if let Some(profit) = execution.actual_profit_lamports {
                warn!("   Realized: {} SOL", lamports_to_sol(profit));
            }
            warn!("   Execution time: {}ms", execution.execution_time_ms);
        }
        ExecutionOutcome::StuckPosition => {
            error!("\n🚨 STUCK POSITION #{}", execution.id);
            error!(
                "   {} units of {} stranded; operator cleanup required",
                execution.stranded_lamports.unwrap_or(0),
                execution.intermediate_mint
            );
            error!(
                "   Error: {}",
                execution.error_message.as_deref().unwrap_or("unknown")
            );
        }
        ExecutionOutcome::NoFundsMoved => {
            error!("\n❌ EXECUTION FAILED #{} (no funds moved)", execution.id);
            error!(
                "   Error: {}",
                execution.error_message.as_deref().unwrap_or("unknown")
            );
        }
    }
}

pub fn print_fee_estimate(estimate: &FeeEstimate) {
    info!(
        "⛽ Fees | median: {} | p90: {} | congestion: {:?} | trend: {:?} | bid: {}{}",
        estimate.median_lamports,
        estimate.p90_lamports,
        estimate.congestion,
        estimate.trend,
        estimate.recommended_fee_lamports,
        if estimate.degraded { " (degraded)" } else { "" }
    );
}
