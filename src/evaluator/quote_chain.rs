//! Hop-by-hop cycle pricing
//!
//! Each candidate path is priced by chaining aggregator quotes: every hop's
//! output feeds the next hop's input, all requests flowing through the
//! scheduler. A path that cannot be fully quoted is abandoned for this scan;
//! a partial cycle is not schedulable.

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use crate::config::settings::{
    BASE_TX_FEE_LAMPORTS, DEFAULT_SLIPPAGE_BPS, QUOTE_TTL_SECS, VOLATILITY_BUFFER_BPS,
};
use crate::config::Config;
use crate::errors::{BotError, BotResult};
use crate::evaluator::scoring::{classify_risk, confidence_score};
use crate::fees::FeeEstimator;
use crate::network::interfaces::{QuoteService, SwapQuote};
use crate::scheduler::{RequestScheduler, TaskPriority};
use crate::types::{CycleLeg, FeeUrgency, Opportunity, StrategyClass, TokenInfo};
use crate::utils::math::lamports_to_usd;

#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub max_slippage_bps: u16,
    pub min_net_profit_lamports: u64,
    pub min_net_profit_usd: Decimal,
    pub base_asset_price_usd: Decimal,
    pub quote_ttl_secs: i64,
    pub base_tx_fee_lamports: u64,
    pub volatility_buffer_bps: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_slippage_bps: DEFAULT_SLIPPAGE_BPS,
            min_net_profit_lamports: 100_000,
            min_net_profit_usd: Decimal::ZERO,
            base_asset_price_usd: Decimal::from(150),
            quote_ttl_secs: QUOTE_TTL_SECS,
            base_tx_fee_lamports: BASE_TX_FEE_LAMPORTS,
            volatility_buffer_bps: VOLATILITY_BUFFER_BPS,
        }
    }
}

impl EvaluatorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_slippage_bps: config.max_slippage_bps,
            min_net_profit_lamports: config.min_net_profit_lamports,
            min_net_profit_usd: config.min_net_profit_usd,
            base_asset_price_usd: config.base_asset_price_usd,
            quote_ttl_secs: QUOTE_TTL_SECS,
            base_tx_fee_lamports: BASE_TX_FEE_LAMPORTS,
            volatility_buffer_bps: VOLATILITY_BUFFER_BPS,
        }
    }
}

pub struct OpportunityEvaluator {
    scheduler: Arc<RequestScheduler>,
    fees: Arc<FeeEstimator>,
    quotes: Arc<dyn QuoteService>,
    config: EvaluatorConfig,
}

impl OpportunityEvaluator {
    pub fn new(
        scheduler: Arc<RequestScheduler>,
        fees: Arc<FeeEstimator>,
        quotes: Arc<dyn QuoteService>,
        config: EvaluatorConfig,
    ) -> Self {
        Self {
            scheduler,
            fees,
            quotes,
            config,
        }
    }

    /// Prices one candidate cycle. Returns `Ok(None)` when the path cannot be
    /// quoted end to end or the net profit does not clear the floors; only
    /// scheduler shutdown is a hard error.
    pub async fn evaluate(
        &self,
        path: &[TokenInfo],
        input_lamports: u64,
    ) -> BotResult<Option<Opportunity>> {
        if path.len() < 3 || path.first().map(|t| t.mint) != path.last().map(|t| t.mint) {
            warn!("Rejecting malformed cycle path: {:?}", path.iter().map(|t| t.symbol).collect::<Vec<_>>());
            return Ok(None);
        }

        let mut legs: Vec<CycleLeg> = Vec::with_capacity(path.len() - 1);
        let mut amount = input_lamports;

        for hop in path.windows(2) {
            let quote = match self.quote_hop(hop[0].mint, hop[1].mint, amount).await {
                Ok(quote) => quote,
                Err(BotError::SchedulerClosed(reason)) => {
                    return Err(BotError::SchedulerClosed(reason));
                }
                Err(e) => {
                    debug!(
                        "Abandoning path at {}->{}: {}",
                        hop[0].symbol, hop[1].symbol, e
                    );
                    return Ok(None);
                }
            };

            amount = quote.out_amount;
            legs.push(CycleLeg {
                input_mint: quote.input_mint.clone(),
                output_mint: quote.output_mint.clone(),
                in_amount: quote.in_amount,
                out_amount: quote.out_amount,
                route_labels: quote.route_labels.clone(),
                route_fee_lamports: quote.route_fee_lamports,
                price_impact_pct: quote.price_impact_pct,
            });
        }

        let final_output = amount;
        let gross_profit = final_output as i64 - input_lamports as i64;
        let estimated_cost = self.estimate_cycle_cost(path, &legs, input_lamports).await;
        let net_profit = gross_profit - estimated_cost as i64;
        let net_profit_usd = lamports_to_usd(net_profit, self.config.base_asset_price_usd);

        if net_profit <= 0
            || net_profit < self.config.min_net_profit_lamports as i64
            || net_profit_usd < self.config.min_net_profit_usd
        {
            debug!(
                "Cycle {} below profit floor: net {} lamports (${})",
                path.iter().map(|t| t.symbol).collect::<Vec<_>>().join("→"),
                net_profit,
                net_profit_usd
            );
            return Ok(None);
        }

        let hop_count = legs.len();
        let now = Utc::now();

        Ok(Some(Opportunity {
            id: Uuid::new_v4().to_string(),
            path: path.to_vec(),
            legs,
            input_lamports,
            expected_return_lamports: final_output,
            gross_profit_lamports: gross_profit,
            estimated_cost_lamports: estimated_cost,
            net_profit_lamports: net_profit,
            net_profit_usd,
            confidence: confidence_score(hop_count, net_profit, estimated_cost),
            risk_level: classify_risk(path, net_profit, estimated_cost),
            created_at: now,
            expires_at: now + ChronoDuration::seconds(self.config.quote_ttl_secs),
        }))
    }

    /// Prices a whole scan batch concurrently. Admission is bounded by the
    /// scheduler, not a local cap, so batch latency tracks the slowest quote
    /// rather than the sum. Results come back best-first.
    pub async fn scan(&self, paths: &[Vec<TokenInfo>], input_lamports: u64) -> Vec<Opportunity> {
        let evaluations = join_all(
            paths
                .iter()
                .map(|path| self.evaluate(path, input_lamports)),
        )
        .await;

        let mut opportunities: Vec<Opportunity> = Vec::new();
        for (path, outcome) in paths.iter().zip(evaluations) {
            match outcome {
                Ok(Some(opportunity)) => opportunities.push(opportunity),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "Evaluation failed for {}: {}",
                        path.iter().map(|t| t.symbol).collect::<Vec<_>>().join("→"),
                        e
                    );
                }
            }
        }

        opportunities.sort_by(|a, b| b.net_profit_lamports.cmp(&a.net_profit_lamports));
        opportunities
    }

    async fn quote_hop(
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
            .execute(TaskPriority::Normal, move || {
                let quotes = Arc::clone(&quotes);
                let input = input.clone();
                let output = output.clone();
                async move { quotes.quote(&input, &output, in_amount, slippage).await }
            })
            .await
    }

    /// base tx fee + priority fee per hop + aggregator routing fees + a
    /// pricing buffer when the cycle touches a volatile book.
    async fn estimate_cycle_cost(
        &self,
        path: &[TokenInfo],
        legs: &[CycleLeg],
        input_lamports: u64,
    ) -> u64 {
        let priority_fee = self
            .fees
            .recommend(FeeUrgency::Normal, StrategyClass::Competitive)
            .await;

        let routing_fees: u64 = legs.iter().map(|l| l.route_fee_lamports).sum();

        let touches_volatile = path
            .iter()
            .skip(1)
            .take(path.len().saturating_sub(2))
            .any(|t| t.is_volatile());
        let volatility_buffer = if touches_volatile {
            input_lamports / 10_000 * self.config.volatility_buffer_bps
        } else {
            0
        };

        self.config.base_tx_fee_lamports
            + priority_fee * legs.len() as u64
            + routing_fees
            + volatility_buffer
    }
}
