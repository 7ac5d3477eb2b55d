//! Cycle execution engine
//!
//! Commits an accepted opportunity as two transactions: the first hop as
//! quoted (forward), then verified-intermediate → base through the aggregator
//! (reverse), which routes any remaining hops internally. Per cycle the state
//! machine runs balance pre-check → forward submit → confirmation → balance
//! verification → reverse with re-quoted retries, and realized profit comes
//! from the actual base-asset balance delta, never from the quote.
//!
//! Attempts are serialized: overlapping cycles against one signing identity
//! would race the balance pre-check. An attempt is not cancellable once the
//! forward leg is submitted; abandoning a position is strictly worse than
//! driving the state machine to an exit.

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;
use crate::config::Config;
use crate::config::settings::{
    BALANCE_POLL_ATTEMPTS, BALANCE_POLL_DELAY_MS, BASE_TX_FEE_LAMPORTS,
    CONFIRMATION_POLL_INTERVAL_MS, CONFIRMATION_TIMEOUT_MS, DEFAULT_SLIPPAGE_BPS,
    REVERSE_RETRY_ATTEMPTS,
};
use crate::errors::{BotError, BotResult};
use crate::fees::FeeEstimator;
use crate::network::backoff::BackoffPolicy;
use crate::network::interfaces::{ChainClient, QuoteService, SwapQuote, TxStatus};
use crate::scheduler::{RequestScheduler, TaskPriority};
use crate::types::{
    CycleLeg, ExecutionOutcome, ExecutionPhase, ExecutionResult, FeeUrgency, Opportunity,
    StrategyClass,
};

#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub confirmation_poll_interval: Duration,
    pub confirmation_timeout: Duration,
    pub balance_poll_attempts: u32,
    pub balance_poll_delay: Duration,
    pub reverse_retry_attempts: u32,
    pub safety_buffer_lamports: u64,
    pub max_slippage_bps: u16,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            confirmation_poll_interval: Duration::from_millis(CONFIRMATION_POLL_INTERVAL_MS),
            confirmation_timeout: Duration::from_millis(CONFIRMATION_TIMEOUT_MS),
            balance_poll_attempts: BALANCE_POLL_ATTEMPTS,
            balance_poll_delay: Duration::from_millis(BALANCE_POLL_DELAY_MS),
            reverse_retry_attempts: REVERSE_RETRY_ATTEMPTS,
            safety_buffer_lamports: 10_000_000,
            max_slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl ExecutionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            safety_buffer_lamports: config.safety_buffer_lamports,
            max_slippage_bps: config.max_slippage_bps,
            ..Self::default()
        }
    }
}

/// Mutable bookkeeping for one attempt. `stranded` holds the verified
/// intermediate amount for exactly as long as capital sits outside the base
/// asset; an error raised while it is set is a stuck position.
struct AttemptTrace {
    phase: ExecutionPhase,
    signatures: Vec<String>,
    stranded: Option<u64>,
}

pub struct ExecutionEngine {
    chain: Arc<dyn ChainClient>,
    quotes: Arc<dyn QuoteService>,
    scheduler: Arc<RequestScheduler>,
    fees: Arc<FeeEstimator>,
    backoff: BackoffPolicy,
    config: ExecutionConfig,
    attempt_lock: tokio::sync::Mutex<()>,
}

impl ExecutionEngine {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        quotes: Arc<dyn QuoteService>,
        scheduler: Arc<RequestScheduler>,
        fees: Arc<FeeEstimator>,
        backoff: BackoffPolicy,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            chain,
            quotes,
            scheduler,
            fees,
            backoff,
            config,
            attempt_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn execute(&self, opportunity: &Opportunity, signer: &str) -> ExecutionResult {
        // One attempt in flight per identity; a second would double-spend the
        // pre-check margin.
        let _guard = self.attempt_lock.lock().await;

        let started = Instant::now();
        let mut trace = AttemptTrace {
            phase: ExecutionPhase::PendingBalanceCheck,
            signatures: Vec::new(),
            stranded: None,
        };

        info!(
            opportunity_id = %opportunity.id,
            route = %opportunity.route_display(),
            input = opportunity.input_lamports,
            expected_net = opportunity.net_profit_lamports,
            "🚀 Executing cycle"
        );

        let outcome = self.run_cycle(opportunity, signer, &mut trace).await;
        let execution_time_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(actual_profit) => {
                let outcome = if actual_profit >= 0 {
                    ExecutionOutcome::Profit
                } else {
                    ExecutionOutcome::Loss
                };
                info!(
                    opportunity_id = %opportunity.id,
                    actual_profit,
                    execution_time_ms,
                    "✅ Cycle completed: {:?}",
                    outcome
                );
                ExecutionResult {
                    id: Uuid::new_v4().to_string(),
                    opportunity_id: opportunity.id.clone(),
                    timestamp: Utc::now(),
                    success: true,
                    signatures: trace.signatures,
                    phase_reached: trace.phase,
                    outcome,
                    intermediate_mint: opportunity.intermediate_token().mint.to_string(),
                    stranded_lamports: None,
                    actual_profit_lamports: Some(actual_profit),
                    execution_time_ms,
                    error_message: None,
                }
            }
            Err(e) => {
                let outcome = if trace.stranded.is_some() {
                    ExecutionOutcome::StuckPosition
                } else {
                    ExecutionOutcome::NoFundsMoved
                };
                warn!(
                    opportunity_id = %opportunity.id,
                    phase = ?trace.phase,
                    outcome = ?outcome,
                    "❌ Cycle failed: {}",
                    e
                );
                ExecutionResult {
                    id: Uuid::new_v4().to_string(),
                    opportunity_id: opportunity.id.clone(),
                    timestamp: Utc::now(),
                    success: false,
                    signatures: trace.signatures,
                    phase_reached: trace.phase,
                    outcome,
                    intermediate_mint: opportunity.intermediate_token().mint.to_string(),
                    stranded_lamports: trace.stranded,
                    actual_profit_lamports: None,
                    execution_time_ms,
                    error_message: Some(e.to_string()),
                }
            }
        }
    }

    async fn run_cycle(
        &self,
        opportunity: &Opportunity,
        signer: &str,
        trace: &mut AttemptTrace,
    ) -> BotResult<i64> {
        // A stale quote must never be executed blind.
        if opportunity.is_expired() {
            return Err(BotError::StaleOpportunity {
                opportunity_id: opportunity.id.clone(),
                expired_at: opportunity.expires_at,
            });
        }

        let base_mint = opportunity.base_token().mint;
        let intermediate_mint = opportunity.intermediate_token().mint;

        // 1. Affordability pre-check. Failing on-chain costs fees; failing
        //    here costs nothing.
        let initial_base = self.chain.balance(signer, base_mint).await?;
        let required = opportunity
            .input_lamports
            .saturating_add(opportunity.estimated_cost_lamports)
            .saturating_add(self.config.safety_buffer_lamports);
        if initial_base < required {
            return Err(BotError::InsufficientFunds {
                required_lamports: required,
                available_lamports: initial_base,
            });
        }

        let initial_intermediate = self.chain.balance(signer, intermediate_mint).await?;
        let priority_fee = self
            .fees
            .recommend(FeeUrgency::High, StrategyClass::Competitive)
            .await;

        // 2. Forward leg: the first hop exactly as quoted, full safety
        //    checks. Losing it to a preventable rejection costs more than the
        //    validation latency.
        let forward_quote = leg_to_quote(&opportunity.legs[0], self.config.max_slippage_bps);
        let forward_sig = self
            .chain
            .submit_swap(&forward_quote, signer, priority_fee)
            .await
            .map_err(|e| BotError::ForwardLegFailed {
                message: "forward submission rejected".to_string(),
                source: Some(e.into()),
            })?;
        trace.signatures.push(forward_sig.clone());
        trace.phase = ExecutionPhase::ForwardSubmitted;

        // 3. Confirmation wait, hard ceiling. A timeout is soft: the
        //    transaction may still land, and balance verification below is
        //    the safety net.
        match self.await_confirmation(&forward_sig).await {
            Ok(()) => trace.phase = ExecutionPhase::ForwardConfirmed,
            Err(BotError::ConfirmationTimeout { signature, waited_ms }) => {
                warn!(
                    %signature,
                    waited_ms,
                    "Forward confirmation ceiling reached, proceeding to balance verification"
                );
            }
            Err(e) => {
                return Err(BotError::ForwardLegFailed {
                    message: "forward leg failed on chain".to_string(),
                    source: Some(e.into()),
                });
            }
        }

        // 4. Verify the intermediate actually landed, and how much of it.
        //    The quoted amount is not trusted: slippage is real.
        let verified = self
            .verify_intermediate_landed(signer, intermediate_mint, initial_intermediate)
            .await?;
        trace.phase = ExecutionPhase::ForwardConfirmed;
        trace.stranded = Some(verified);

        // 5. Advisory profitability re-check before committing the reverse
        //    leg. It never aborts: capital is already out of base, and
        //    recovering it dominates stranding it.
        self.recheck_reverse_profitability(opportunity, intermediate_mint, base_mint, verified)
            .await;

        // 6. Reverse leg with re-quoted retries.
        let final_base = self
            .execute_reverse(
                opportunity,
                signer,
                intermediate_mint,
                base_mint,
                verified,
                priority_fee,
                trace,
            )
            .await?;

        trace.stranded = None;
        trace.phase = ExecutionPhase::ReverseConfirmed;

        Ok(final_base as i64 - initial_base as i64)
    }

    async fn await_confirmation(&self, signature: &str) -> BotResult<()> {
        let deadline = Instant::now() + self.config.confirmation_timeout;
        let started = Instant::now();

        loop {
            match self.chain.transaction_status(signature).await {
                Ok(status) if status.is_landed() => return Ok(()),
                Ok(TxStatus::Failed) => {
                    return Err(BotError::Network {
                        message: format!("transaction {signature} failed on chain"),
                        source: None,
                        retry_count: 0,
                    });
                }
                Ok(TxStatus::Confirmed) | Ok(TxStatus::Finalized) => return Ok(()),
                Ok(TxStatus::Pending) => {}
                Err(e) => {
                    warn!("Status poll failed for {}: {}", signature, e);
                }
            }

            if Instant::now() >= deadline {
                return Err(BotError::ConfirmationTimeout {
                    signature: signature.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(self.config.confirmation_poll_interval).await;
        }
    }

    /// Polls the intermediate balance until it exceeds the pre-forward level,
    /// returning the delta that actually landed.
    async fn verify_intermediate_landed(
        &self,
        signer: &str,
        intermediate_mint: &str,
        initial_intermediate: u64,
    ) -> BotResult<u64> {
        for attempt in 0..self.config.balance_poll_attempts {
            match self.chain.balance(signer, intermediate_mint).await {
                Ok(balance) if balance > initial_intermediate => {
                    return Ok(balance - initial_intermediate);
                }
                Ok(_) => {}
                Err(e) => warn!(
                    "Balance poll {}/{} failed: {}",
                    attempt + 1,
                    self.config.balance_poll_attempts,
                    e
                ),
            }
            tokio::time::sleep(self.config.balance_poll_delay).await;
        }

        Err(BotError::ForwardLegFailed {
            message: format!(
                "intermediate {} balance never landed after {} polls",
                intermediate_mint, self.config.balance_poll_attempts
            ),
            source: None,
        })
    }

    async fn recheck_reverse_profitability(
        &self,
        opportunity: &Opportunity,
        intermediate_mint: &str,
        base_mint: &str,
        verified: u64,
    ) {
        match self
            .quote_via_scheduler(intermediate_mint, base_mint, verified)
            .await
        {
            Ok(quote) => {
                let remaining_cost = (BASE_TX_FEE_LAMPORTS
                    + self
                        .fees
                        .recommend(FeeUrgency::High, StrategyClass::Competitive)
                        .await) as i64;
                let expected_net =
                    quote.out_amount as i64 - opportunity.input_lamports as i64 - remaining_cost;
                if expected_net < 0 {
                    warn!(
                        opportunity_id = %opportunity.id,
                        expected_net,
                        "Market moved against the cycle; reversing to recover capital"
                    );
                }
            }
            Err(e) => warn!(
                opportunity_id = %opportunity.id,
                "Pre-reverse profitability re-check unavailable: {}", e
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_reverse(
        &self,
        opportunity: &Opportunity,
        signer: &str,
        intermediate_mint: &str,
        base_mint: &str,
        verified: u64,
        priority_fee: u64,
        trace: &mut AttemptTrace,
    ) -> BotResult<u64> {
        let pre_reverse_base = self.chain.balance(signer, base_mint).await?;
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 1..=self.config.reverse_retry_attempts {
            // A failed attempt means the market moved or the quote expired;
            // always re-quote the verified amount.
            let quote = match self
                .quote_via_scheduler(intermediate_mint, base_mint, verified)
                .await
            {
                Ok(quote) => quote,
                Err(e) => {
                    warn!("Reverse quote attempt {} failed: {}", attempt, e);
                    last_error = Some(e.into());
                    tokio::time::sleep(self.backoff.delay_for(attempt)).await;
                    continue;
                }
            };

            let signature = match self.chain.submit_swap(&quote, signer, priority_fee).await {
                Ok(signature) => signature,
                Err(e) => {
                    warn!("Reverse submission attempt {} failed: {}", attempt, e);
                    last_error = Some(e.into());
                    tokio::time::sleep(self.backoff.delay_for(attempt)).await;
                    continue;
                }
            };
            trace.signatures.push(signature.clone());
            trace.phase = ExecutionPhase::ReverseSubmitted;

            match self.await_confirmation(&signature).await {
                Ok(()) => {}
                Err(BotError::ConfirmationTimeout { .. }) => {
                    warn!("Reverse confirmation ceiling reached, verifying balance anyway");
                }
                Err(e) => {
                    warn!("Reverse leg attempt {} failed on chain: {}", attempt, e);
                    last_error = Some(e.into());
                    tokio::time::sleep(self.backoff.delay_for(attempt)).await;
                    continue;
                }
            }

            // Settlement check: did base actually come back?
            for _ in 0..self.config.balance_poll_attempts {
                match self.chain.balance(signer, base_mint).await {
                    Ok(balance) if balance > pre_reverse_base => return Ok(balance),
                    Ok(_) => {}
                    Err(e) => warn!("Base balance poll failed: {}", e),
                }
                tokio::time::sleep(self.config.balance_poll_delay).await;
            }
            warn!("Reverse attempt {} never settled, retrying", attempt);
            tokio::time::sleep(self.backoff.delay_for(attempt)).await;
        }

        Err(BotError::ReverseLegExhausted {
            intermediate_mint: intermediate_mint.to_string(),
            stranded_lamports: verified,
            attempts: self.config.reverse_retry_attempts,
            source: last_error,
        })
    }

    async fn quote_via_scheduler(
        &self,
        input_mint: &str,
        output_mint: &str,
        in_amount: u64,
    ) -> BotResult<SwapQuote> {
        let quotes = Arc::clone(&self.quotes);
        let input = input_mint.to_string();
        let output = output_mint.to_string();
        let slippage = self.config.max_slippage_bps;

        self.scheduler
            .execute(TaskPriority::High, move || {
                let quotes = Arc::clone(&quotes);
                let input = input.clone();
                let output = output.clone();
                async move { quotes.quote(&input, &output, in_amount, slippage).await }
            })
            .await
    }
}

fn leg_to_quote(leg: &CycleLeg, slippage_bps: u16) -> SwapQuote {
    SwapQuote {
        input_mint: leg.input_mint.clone(),
        output_mint: leg.output_mint.clone(),
        in_amount: leg.in_amount,
        out_amount: leg.out_amount,
        route_labels: leg.route_labels.clone(),
        route_fee_lamports: leg.route_fee_lamports,
        price_impact_pct: leg.price_impact_pct,
        slippage_bps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use crate::scheduler::RateLimits;
    use crate::network::interfaces::FeeSampleSource;
    use crate::types::tokens::{SOL, TOKEN_UNIVERSE, find_token};
    use crate::types::RiskLevel;

    struct EmptyFeeSource;

    #[async_trait]
    impl FeeSampleSource for EmptyFeeSource {
        async fn recent_priority_fees(&self) -> BotResult<Vec<u64>> {
            Ok(vec![])
        }
    }

    /// In-memory ledger double that counts submissions and scripts the
    /// forward leg's confirmation and landing behavior.
    struct MockChain {
        balances: Mutex<HashMap<String, u64>>,
        submit_count: AtomicU32,
        fail_reverse_submits: bool,
        forward_confirms: bool,
        forward_landed_amount: u64,
        reverse_out_amount: u64,
    }

    impl MockChain {
        fn new(initial_sol: u64) -> Self {
            let mut balances = HashMap::new();
            balances.insert(SOL.mint.to_string(), initial_sol);
            Self {
                balances: Mutex::new(balances),
                submit_count: AtomicU32::new(0),
                fail_reverse_submits: false,
                forward_confirms: true,
                forward_landed_amount: 148_000_000,
                reverse_out_amount: 1_030_000_000,
            }
        }

        fn submits(&self) -> u32 {
            self.submit_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn submit_swap(
            &self,
            quote: &SwapQuote,
            _signer_pubkey: &str,
            _priority_fee_lamports: u64,
        ) -> BotResult<String> {
            let n = self.submit_count.fetch_add(1, Ordering::SeqCst);

            if quote.input_mint == SOL.mint {
                // Forward leg: spend base, maybe land the intermediate.
                let mut balances = self.balances.lock().unwrap();
                let base = balances.entry(SOL.mint.to_string()).or_insert(0);
                *base = base.saturating_sub(quote.in_amount);
                if self.forward_landed_amount > 0 {
                    *balances.entry(quote.output_mint.clone()).or_insert(0) +=
                        self.forward_landed_amount;
                }
                Ok(format!("fwd-{n}"))
            } else {
                if self.fail_reverse_submits {
                    return Err(BotError::Network {
                        message: "simulated broadcast rejection".to_string(),
                        source: None,
                        retry_count: 0,
                    });
                }
                let mut balances = self.balances.lock().unwrap();
                let inter = balances.entry(quote.input_mint.clone()).or_insert(0);
                *inter = inter.saturating_sub(quote.in_amount);
                *balances.entry(SOL.mint.to_string()).or_insert(0) += self.reverse_out_amount;
                Ok(format!("rev-{n}"))
            }
        }

        async fn transaction_status(&self, signature: &str) -> BotResult<TxStatus> {
            if signature.starts_with("fwd") && !self.forward_confirms {
                return Ok(TxStatus::Pending);
            }
            Ok(TxStatus::Confirmed)
        }

        async fn balance(&self, _owner: &str, mint: &str) -> BotResult<u64> {
            Ok(*self.balances.lock().unwrap().get(mint).unwrap_or(&0))
        }
    }

    struct FixedReverseQuotes {
        out_amount: u64,
    }

    #[async_trait]
    impl QuoteService for FixedReverseQuotes {
        async fn quote(
            &self,
            input_mint: &str,
            output_mint: &str,
            in_amount: u64,
            max_slippage_bps: u16,
        ) -> BotResult<SwapQuote> {
            Ok(SwapQuote {
                input_mint: input_mint.to_string(),
                output_mint: output_mint.to_string(),
                in_amount,
                out_amount: self.out_amount,
                route_labels: vec!["Scripted".to_string()],
                route_fee_lamports: 0,
                price_impact_pct: Decimal::ZERO,
                slippage_bps: max_slippage_bps,
            })
        }
    }

    fn engine(chain: Arc<MockChain>) -> ExecutionEngine {
        ExecutionEngine::new(
            chain,
            Arc::new(FixedReverseQuotes {
                out_amount: 1_030_000_000,
            }),
            Arc::new(RequestScheduler::new(RateLimits {
                requests_per_second: 1_000,
                requests_per_minute: 60_000,
                burst_limit: 1_000,
                burst_window: Duration::from_secs(10),
                rate_limit_cooldown: Duration::from_secs(1),
            })),
            Arc::new(FeeEstimator::new(Arc::new(EmptyFeeSource))),
            BackoffPolicy {
                initial_delay_ms: 1,
                ..BackoffPolicy::default()
            },
            ExecutionConfig::default(),
        )
    }

    fn opportunity(expires_in_secs: i64) -> Opportunity {
        let usdc = find_token(&TOKEN_UNIVERSE, "USDC").unwrap().clone();
        let usdt = find_token(&TOKEN_UNIVERSE, "USDT").unwrap().clone();
        let now = Utc::now();
        let leg = |input: &crate::types::TokenInfo, output: &crate::types::TokenInfo, in_amount, out_amount| CycleLeg {
            input_mint: input.mint.to_string(),
            output_mint: output.mint.to_string(),
            in_amount,
            out_amount,
            route_labels: vec!["Scripted".to_string()],
            route_fee_lamports: 0,
            price_impact_pct: Decimal::ZERO,
        };

        Opportunity {
            id: "opp-1".to_string(),
            path: vec![SOL, usdc.clone(), usdt.clone(), SOL],
            legs: vec![
                leg(&SOL, &usdc, 1_000_000_000, 150_000_000),
                leg(&usdc, &usdt, 150_000_000, 150_000_000),
                leg(&usdt, &SOL, 150_000_000, 1_050_000_000),
            ],
            input_lamports: 1_000_000_000,
            expected_return_lamports: 1_050_000_000,
            gross_profit_lamports: 50_000_000,
            estimated_cost_lamports: 1_000_000,
            net_profit_lamports: 49_000_000,
            net_profit_usd: Decimal::from(7),
            confidence: 0.7,
            risk_level: RiskLevel::Low,
            created_at: now,
            expires_at: now + ChronoDuration::seconds(expires_in_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn realized_profit_comes_from_balance_delta() {
        let chain = Arc::new(MockChain::new(2_000_000_000));
        let engine = engine(Arc::clone(&chain));

        let result = engine.execute(&opportunity(60), "signer").await;

        assert!(result.success);
        assert_eq!(result.outcome, ExecutionOutcome::Profit);
        // 2.0 SOL - 1.0 committed + 1.03 recovered = 2.03 SOL: +0.03 realized,
        // even though the quote promised +0.05.
        assert_eq!(result.actual_profit_lamports, Some(30_000_000));
        assert_eq!(result.signatures.len(), 2);
        assert!(result.signatures[0].starts_with("fwd"));
        assert!(result.signatures[1].starts_with("rev"));
        assert_eq!(result.phase_reached, ExecutionPhase::ReverseConfirmed);
        assert_eq!(result.stranded_lamports, None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_balance_precheck_submits_nothing() {
        let chain = Arc::new(MockChain::new(500_000_000));
        let engine = engine(Arc::clone(&chain));

        let result = engine.execute(&opportunity(60), "signer").await;

        assert!(!result.success);
        assert_eq!(result.outcome, ExecutionOutcome::NoFundsMoved);
        assert_eq!(result.phase_reached, ExecutionPhase::PendingBalanceCheck);
        assert_eq!(chain.submits(), 0);
        assert!(result.error_message.unwrap().contains("Insufficient funds"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_opportunity_is_rejected_before_submission() {
        let chain = Arc::new(MockChain::new(2_000_000_000));
        let engine = engine(Arc::clone(&chain));

        let result = engine.execute(&opportunity(-1), "signer").await;

        assert!(!result.success);
        assert_eq!(result.outcome, ExecutionOutcome::NoFundsMoved);
        assert_eq!(chain.submits(), 0);
        assert!(result.error_message.unwrap().contains("expired"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_reverse_is_a_stuck_position() {
        let mut chain = MockChain::new(2_000_000_000);
        chain.fail_reverse_submits = true;
        let chain = Arc::new(chain);
        let engine = engine(Arc::clone(&chain));

        let result = engine.execute(&opportunity(60), "signer").await;

        assert!(!result.success);
        assert_eq!(result.outcome, ExecutionOutcome::StuckPosition);
        // The verified delta, not the quoted 150_000_000.
        assert_eq!(result.stranded_lamports, Some(148_000_000));
        assert_eq!(result.signatures.len(), 1);
        assert!(result.error_message.unwrap().contains("stranded"));
    }

    #[tokio::test(start_paused = true)]
    async fn forward_that_never_lands_is_not_a_stuck_position() {
        let mut chain = MockChain::new(2_000_000_000);
        chain.forward_confirms = false;
        chain.forward_landed_amount = 0;
        let chain = Arc::new(chain);
        let engine = engine(Arc::clone(&chain));

        let result = engine.execute(&opportunity(60), "signer").await;

        assert!(!result.success);
        assert_eq!(result.outcome, ExecutionOutcome::NoFundsMoved);
        assert_eq!(result.stranded_lamports, None);
        // Only the forward submission happened.
        assert_eq!(chain.submits(), 1);
        assert!(result.error_message.unwrap().contains("never landed"));
    }

    #[tokio::test(start_paused = true)]
    async fn unprofitable_reverse_still_completes_as_loss() {
        let mut chain = MockChain::new(2_000_000_000);
        chain.reverse_out_amount = 980_000_000;
        let chain = Arc::new(chain);
        let engine = engine(Arc::clone(&chain));

        let result = engine.execute(&opportunity(60), "signer").await;

        assert!(result.success);
        assert_eq!(result.outcome, ExecutionOutcome::Loss);
        assert_eq!(result.actual_profit_lamports, Some(-20_000_000));
        assert_eq!(result.stranded_lamports, None);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_timeout_is_soft_when_balance_lands() {
        // Status never confirms, but the intermediate lands: the engine must
        // proceed through balance verification and finish the cycle.
        let mut chain = MockChain::new(2_000_000_000);
        chain.forward_confirms = false;
        let chain = Arc::new(chain);
        let engine = engine(Arc::clone(&chain));

        let result = engine.execute(&opportunity(60), "signer").await;

        assert!(result.success);
        assert_eq!(result.outcome, ExecutionOutcome::Profit);
        assert_eq!(result.actual_profit_lamports, Some(30_000_000));
    }
}
