//! Custom error types for the bot

use std::time::Duration;
use thiserror::Error;

/// Markers that identify a throttling response regardless of which upstream
/// produced it. The quote aggregator and the RPC endpoint phrase these
/// differently.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "too many requests",
    "429",
    "-32005",
    "exceeded",
];

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Rate limited by upstream: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Quote unavailable for {input_mint} -> {output_mint}: {message}")]
    QuoteUnavailable {
        input_mint: String,
        output_mint: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Insufficient funds: need {required_lamports} lamports, have {available_lamports}")]
    InsufficientFunds {
        required_lamports: u64,
        available_lamports: u64,
    },

    #[error("Forward leg failed: {message}")]
    ForwardLegFailed {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error(
        "Reverse leg exhausted after {attempts} attempts: {stranded_lamports} lamports of \
         {intermediate_mint} stranded"
    )]
    ReverseLegExhausted {
        intermediate_mint: String,
        stranded_lamports: u64,
        attempts: u32,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Confirmation timed out for {signature} after {waited_ms}ms")]
    ConfirmationTimeout { signature: String, waited_ms: u64 },

    #[error("Opportunity {opportunity_id} expired at {expired_at}")]
    StaleOpportunity {
        opportunity_id: String,
        expired_at: chrono::DateTime<chrono::Utc>,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        retry_count: u32,
    },

    #[error("Data parsing error: {context}")]
    DataParsing {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Scheduler unavailable: {0}")]
    SchedulerClosed(String),
}

pub type BotResult<T> = Result<T, BotError>;

impl BotError {
    /// Whether this failure is a throttling signal the scheduler should absorb
    /// and retry rather than propagate.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            BotError::RateLimited { .. } => true,
            BotError::Network { message, source, .. } => {
                is_rate_limit_message(message)
                    || source
                        .as_ref()
                        .is_some_and(|e| is_rate_limit_message(&e.to_string()))
            }
            BotError::QuoteUnavailable { message, .. } => is_rate_limit_message(message),
            _ => false,
        }
    }

    /// Stuck positions require operator action; everything else resolves on
    /// its own or costs nothing beyond the attempt.
    pub fn leaves_stuck_position(&self) -> bool {
        matches!(self, BotError::ReverseLegExhausted { .. })
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m))
}
