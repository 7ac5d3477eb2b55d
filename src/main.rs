//! Cycle Arbitrage Bot - Main Entry Point
//!
//! Operator process: scans round-trip cycles against the aggregator on an
//! adaptive interval and (optionally) executes the best one per batch against
//! the simulated ledger.

use cycle_arb_bot::*;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use crate::cycles::CyclePath;
use crate::network::interfaces::{FeeSampleSource, QuoteService};
use crate::types::tokens::{SOL, TOKEN_UNIVERSE};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    let _logging_guard = utils::setup_logging()?;
    utils::setup_output_directories()?;

    // Load configuration
    let config = Config::load();

    info!("🔁 Cycle Arbitrage Bot v0.3.0 - Scan & Execute");
    info!("📋 Configuration:");
    info!("   Quote API: {}", config.quote_api_url);
    info!("   Trade size: {} SOL", utils::lamports_to_sol(config.trade_size_lamports as i64));
    info!("   Min net profit: {} SOL (${})",
        utils::lamports_to_sol(config.min_net_profit_lamports as i64),
        config.min_net_profit_usd
    );
    info!("   Rate budget: {}/s, {}/min, burst {}",
        config.requests_per_second, config.requests_per_minute, config.burst_limit
    );
    info!("   Execution: {}", if config.enable_execution { "PAPER (simulated ledger)" } else { "scan only" });

    // Wire components explicitly; nothing here is a global.
    let scheduler = Arc::new(scheduler::RequestScheduler::new(scheduler::RateLimits {
        requests_per_second: config.requests_per_second,
        requests_per_minute: config.requests_per_minute,
        burst_limit: config.burst_limit,
        ..scheduler::RateLimits::default()
    }));

    let ledger = Arc::new(execution::SimulatedLedger::new(
        execution::SimulationParams::default(),
    ));
    // Seed the paper wallet with enough base asset for a cycle plus headroom.
    ledger
        .airdrop(
            &config.signer_pubkey,
            SOL.mint,
            config.trade_size_lamports * 3 + config.safety_buffer_lamports,
        )
        .await;

    let fee_source: Arc<dyn FeeSampleSource> = match &config.rpc_url {
        Some(url) => {
            info!("   Fee samples: live RPC at {}", url);
            Arc::new(network::RpcClient::new(url)?)
        }
        None => {
            info!("   Fee samples: simulated");
            Arc::clone(&ledger) as Arc<dyn FeeSampleSource>
        }
    };
    let fees = Arc::new(fees::FeeEstimator::new(fee_source));

    let quotes: Arc<dyn QuoteService> = Arc::new(network::HttpQuoteClient::new(&config.quote_api_url)?);

    let evaluator = evaluator::OpportunityEvaluator::new(
        Arc::clone(&scheduler),
        Arc::clone(&fees),
        Arc::clone(&quotes),
        evaluator::EvaluatorConfig::from_config(&config),
    );

    let engine = execution::ExecutionEngine::new(
        Arc::clone(&ledger) as Arc<dyn network::ChainClient>,
        Arc::clone(&quotes),
        Arc::clone(&scheduler),
        Arc::clone(&fees),
        network::BackoffPolicy::default(),
        execution::ExecutionConfig::from_config(&config),
    );

    let history = storage::TradeHistory::default();
    let circuit_breaker = Arc::new(errors::CircuitBreaker::new(
        config.max_consecutive_errors,
        config.circuit_breaker_cooldown_secs,
    ));

    // Candidate cycles are generated once; the token universe is static.
    let mut paths: Vec<CyclePath> = cycles::three_hop_cycles(&SOL, &TOKEN_UNIVERSE);
    if config.enable_four_hop {
        paths.extend(cycles::four_hop_cycles(
            &SOL,
            &TOKEN_UNIVERSE,
            config.four_hop_candidate_cap,
        ));
    }
    if config.enable_curated_routes {
        paths.extend(cycles::curated_cycles(&SOL, &TOKEN_UNIVERSE));
    }
    info!("🧭 Generated {} candidate cycles", paths.len());

    // Setup shutdown handler
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    let shutdown_tx = Arc::new(tokio::sync::Mutex::new(Some(shutdown_tx)));

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("\n📛 Received shutdown signal (Ctrl+C)...");
        if let Some(tx) = shutdown_tx.lock().await.take() {
            let _ = tx.send(());
        }
    });

    info!("\n🚀 Starting scan loop...\n");

    let start_time = Instant::now();
    let mut state = ScanState::new();
    let min_delay = Duration::from_millis(config.min_scan_delay_ms);
    let max_delay = Duration::from_millis(config.max_scan_delay_ms);

    loop {
        // The stop flag is honored between batches only; an in-flight
        // execution attempt always runs to an exit.
        let scan_delay = scheduler.recommended_scan_delay(min_delay, max_delay).await;
        tokio::select! {
            _ = tokio::time::sleep(scan_delay) => {
                if let Err(e) = run_scan_cycle(
                    &config,
                    &evaluator,
                    &engine,
                    &fees,
                    &history,
                    &circuit_breaker,
                    &paths,
                    &mut state,
                ).await {
                    error!("Scan cycle error: {}", e);
                    *state.error_counts.entry("scan_cycle".to_string()).or_insert(0) += 1;
                    if circuit_breaker.record_error().await {
                        error!("Circuit breaker activated due to scan errors");
                    }
                }

                if start_time.elapsed().as_secs() % 30 < scan_delay.as_secs().max(1) {
                    let health = utils::run_health_check(
                        &scheduler,
                        &fees,
                        &circuit_breaker,
                        start_time,
                    ).await;
                    info!(
                        "🏥 Health: queue={} util={:.0}% fees={} uptime={}s",
                        health.scheduler_queue_depth,
                        health.scheduler_minute_utilization * 100.0,
                        if health.fee_estimate_degraded { "DEGRADED" } else { "OK" },
                        health.uptime_seconds
                    );
                }
            }
            _ = &mut shutdown_rx => {
                info!("Shutdown signal received, exiting scan loop...");
                break;
            }
        }
    }

    // Final session statistics
    let summary = history.summary().await;
    utils::print_session_stats(
        start_time,
        &summary,
        state.scan_batches,
        &state.error_counts,
        &circuit_breaker,
    )
    .await;
    info!("🛑 Shut down after {:?}", start_time.elapsed());

    Ok(())
}

/// Per-session counters for the scan loop
struct ScanState {
    scan_batches: u64,
    error_counts: HashMap<String, u32>,
}

impl ScanState {
    fn new() -> Self {
        Self {
            scan_batches: 0,
            error_counts: HashMap::new(),
        }
    }
}

/// Run one scan batch and optionally execute the best opportunity
#[allow(clippy::too_many_arguments)]
async fn run_scan_cycle(
    config: &Config,
    evaluator: &evaluator::OpportunityEvaluator,
    engine: &execution::ExecutionEngine,
    fees: &fees::FeeEstimator,
    history: &storage::TradeHistory,
    circuit_breaker: &Arc<errors::CircuitBreaker>,
    paths: &[CyclePath],
    state: &mut ScanState,
) -> Result<()> {
    if !circuit_breaker.can_proceed().await {
        warn!("⚡ Circuit breaker is OPEN, waiting for cooldown...");
        tokio::time::sleep(Duration::from_secs(10)).await;
        return Ok(());
    }

    // Refresh the fee picture first; bids and cost models both read it.
    let estimate = fees.analyze().await;
    utils::print_fee_estimate(&estimate);

    let opportunities = evaluator.scan(paths, config.trade_size_lamports).await;
    state.scan_batches += 1;

    if opportunities.is_empty() {
        info!("🔍 Scan {}: no profitable cycles", state.scan_batches);
        circuit_breaker.record_success().await;
        return Ok(());
    }

    info!(
        "🔍 Scan {}: {} profitable cycle(s), best {} SOL net",
        state.scan_batches,
        opportunities.len(),
        utils::lamports_to_sol(opportunities[0].net_profit_lamports)
    );

    for opportunity in &opportunities {
        history.record_opportunity(opportunity).await;
    }

    let best = &opportunities[0];
    utils::print_opportunity(best);

    if config.enable_execution {
        let result = engine.execute(best, &config.signer_pubkey).await;
        utils::print_execution_result(&result);
        history.record_execution(&result).await;

        match result.outcome {
            types::ExecutionOutcome::StuckPosition => {
                // A stranded position needs operator attention before the
                // loop keeps committing capital.
                error!("Pausing after stuck position; operator action required");
                circuit_breaker.record_error().await;
            }
            _ => circuit_breaker.record_success().await,
        }
    } else {
        circuit_breaker.record_success().await;
    }

    Ok(())
}
