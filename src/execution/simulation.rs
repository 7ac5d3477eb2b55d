//! Simulated ledger for paper trading
//!
//! Implements the chain collaborator contracts against an in-memory balance
//! book, with randomized submission latency, confirmation delay, slippage and
//! broadcast failures. The default operating mode runs the full execution
//! state machine against this ledger; live broadcasting plugs in behind the
//! same traits.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;
use crate::errors::{BotError, BotResult};
use crate::network::interfaces::{ChainClient, FeeSampleSource, SwapQuote, TxStatus};

#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub submit_latency_ms: (u64, u64),
    pub confirm_delay_ms: (u64, u64),
    pub max_slippage_bps: u64,
    pub broadcast_failure_rate: f64,
    pub priority_fee_base_lamports: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            submit_latency_ms: (40, 120),
            confirm_delay_ms: (200, 800),
            max_slippage_bps: 40,
            broadcast_failure_rate: 0.02,
            priority_fee_base_lamports: 20_000,
        }
    }
}

struct PendingSettlement {
    owner: String,
    mint: String,
    amount: u64,
    due: Instant,
}

struct SimState {
    balances: HashMap<(String, String), u64>,
    pending: Vec<PendingSettlement>,
    confirm_at: HashMap<String, Instant>,
}

pub struct SimulatedLedger {
    params: SimulationParams,
    state: Mutex<SimState>,
}

impl SimulatedLedger {
    pub fn new(params: SimulationParams) -> Self {
        Self {
            params,
            state: Mutex::new(SimState {
                balances: HashMap::new(),
                pending: Vec::new(),
                confirm_at: HashMap::new(),
            }),
        }
    }

    /// Seeds an account for the paper-trading session.
    pub async fn airdrop(&self, owner: &str, mint: &str, amount: u64) {
        let mut state = self.state.lock().await;
        *state
            .balances
            .entry((owner.to_string(), mint.to_string()))
            .or_insert(0) += amount;
    }

    fn in_range(range: (u64, u64)) -> u64 {
        let (low, high) = range;
        if high <= low {
            return low;
        }
        low + (rand::random::<f64>() * (high - low) as f64) as u64
    }

    fn settle_due(state: &mut SimState, now: Instant) {
        let mut index = 0;
        while index < state.pending.len() {
            if state.pending[index].due <= now {
                let settlement = state.pending.swap_remove(index);
                *state
                    .balances
                    .entry((settlement.owner, settlement.mint))
                    .or_insert(0) += settlement.amount;
            } else {
                index += 1;
            }
        }
    }
}

#[async_trait]
impl ChainClient for SimulatedLedger {
    async fn submit_swap(
        &self,
        quote: &SwapQuote,
        signer_pubkey: &str,
        priority_fee_lamports: u64,
    ) -> BotResult<String> {
        tokio::time::sleep(Duration::from_millis(Self::in_range(
            self.params.submit_latency_ms,
        )))
        .await;

        if rand::random::<f64>() < self.params.broadcast_failure_rate {
            return Err(BotError::Network {
                message: "simulated broadcast rejection".to_string(),
                source: None,
                retry_count: 0,
            });
        }

        let now = Instant::now();
        let mut state = self.state.lock().await;
        Self::settle_due(&mut state, now);

        let input_key = (signer_pubkey.to_string(), quote.input_mint.clone());
        let held = state.balances.get(&input_key).copied().unwrap_or(0);
        if held < quote.in_amount {
            return Err(BotError::Network {
                message: format!(
                    "simulated ledger: {} holds {} of {}, swap needs {}",
                    signer_pubkey, held, quote.input_mint, quote.in_amount
                ),
                source: None,
                retry_count: 0,
            });
        }
        if let Some(balance) = state.balances.get_mut(&input_key) {
            *balance -= quote.in_amount;
        }

        // Realized output slips below the quote by a random number of bps.
        let slippage_bps = (rand::random::<f64>() * self.params.max_slippage_bps as f64) as u64;
        let credited = quote.out_amount - quote.out_amount / 10_000 * slippage_bps;

        let signature = format!("sim-{}", Uuid::new_v4());
        let due = now + Duration::from_millis(Self::in_range(self.params.confirm_delay_ms));
        state.pending.push(PendingSettlement {
            owner: signer_pubkey.to_string(),
            mint: quote.output_mint.clone(),
            amount: credited,
            due,
        });
        state.confirm_at.insert(signature.clone(), due);

        debug!(
            %signature,
            input = %quote.input_mint,
            output = %quote.output_mint,
            credited,
            slippage_bps,
            priority_fee_lamports,
            "Simulated swap submitted"
        );

        Ok(signature)
    }

    async fn transaction_status(&self, signature: &str) -> BotResult<TxStatus> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        Self::settle_due(&mut state, now);

        match state.confirm_at.get(signature) {
            Some(due) if now >= *due => Ok(TxStatus::Confirmed),
            Some(_) => Ok(TxStatus::Pending),
            None => Ok(TxStatus::Failed),
        }
    }

    async fn balance(&self, owner: &str, mint: &str) -> BotResult<u64> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        Self::settle_due(&mut state, now);

        Ok(state
            .balances
            .get(&(owner.to_string(), mint.to_string()))
            .copied()
            .unwrap_or(0))
    }
}

#[async_trait]
impl FeeSampleSource for SimulatedLedger {
    async fn recent_priority_fees(&self) -> BotResult<Vec<u64>> {
        let base = self.params.priority_fee_base_lamports as f64;
        Ok((0..20)
            .map(|_| (base * (0.4 + rand::random::<f64>() * 2.0)) as u64)
            .collect())
    }
}
