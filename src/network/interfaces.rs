//! Collaborator contracts the core is written against
//!
//! The aggregator and the ledger are black boxes behind these traits; the
//! production implementations live beside them in this module, the simulated
//! ledger in `execution::simulation`, and tests substitute counting mocks.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use crate::errors::BotResult;

/// A single aggregator quote: how much `output_mint` you get for
/// `in_amount` of `input_mint`, and what the route costs.
#[derive(Debug, Clone, Serialize)]
pub struct SwapQuote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    pub route_labels: Vec<String>,
    pub route_fee_lamports: u64,
    pub price_impact_pct: Decimal,
    pub slippage_bps: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Finalized,
    Failed,
}

impl TxStatus {
    pub fn is_landed(&self) -> bool {
        matches!(self, TxStatus::Confirmed | TxStatus::Finalized)
    }
}

/// Quote service: prices one swap without committing anything.
#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        in_amount: u64,
        max_slippage_bps: u16,
    ) -> BotResult<SwapQuote>;
}

/// Ledger access needed for execution: build-and-submit a quoted swap,
/// poll a signature, read balances.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Builds, signs and broadcasts the swap described by `quote`, bidding
    /// `priority_fee_lamports` on top of the base fee. Returns the signature.
    async fn submit_swap(
        &self,
        quote: &SwapQuote,
        signer_pubkey: &str,
        priority_fee_lamports: u64,
    ) -> BotResult<String>;

    async fn transaction_status(&self, signature: &str) -> BotResult<TxStatus>;

    /// Balance of `mint` held by `owner`, in the mint's atomic units.
    async fn balance(&self, owner: &str, mint: &str) -> BotResult<u64>;
}

/// Source of recently observed network priority fees, in lamports.
#[async_trait]
pub trait FeeSampleSource: Send + Sync {
    async fn recent_priority_fees(&self) -> BotResult<Vec<u64>>;
}
