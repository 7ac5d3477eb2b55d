//! Cycle opportunity types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use super::TokenInfo;

/// One priced hop of a cycle, as quoted by the aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct CycleLeg {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Venue labels the aggregator picked for this hop, e.g. ["Orca", "Raydium"].
    pub route_labels: Vec<String>,
    pub route_fee_lamports: u64,
    pub price_impact_pct: Decimal,
}

/// Ordered risk classification. Volatile intermediates are HIGH regardless of
/// margin; otherwise risk falls as margin grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    UltraLow,
    Low,
    Medium,
    High,
}

/// A priced, not-yet-executed round-trip cycle. Immutable after creation: a
/// stale opportunity is re-quoted, never patched.
#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    pub id: String,
    pub path: Vec<TokenInfo>,
    pub legs: Vec<CycleLeg>,
    pub input_lamports: u64,
    pub expected_return_lamports: u64,
    pub gross_profit_lamports: i64,
    pub estimated_cost_lamports: u64,
    pub net_profit_lamports: i64,
    pub net_profit_usd: Decimal,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Opportunity {
    pub fn hop_count(&self) -> usize {
        self.legs.len()
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn base_token(&self) -> &TokenInfo {
        &self.path[0]
    }

    /// The asset held between the forward and reverse legs.
    pub fn intermediate_token(&self) -> &TokenInfo {
        &self.path[1]
    }

    /// Short human-readable route, e.g. "SOL→USDC→JUP→SOL".
    pub fn route_display(&self) -> String {
        self.path
            .iter()
            .map(|t| t.symbol)
            .collect::<Vec<_>>()
            .join("→")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tokens::{SOL, TOKEN_UNIVERSE, find_token};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn sample_opportunity(expires_in_secs: i64) -> Opportunity {
        let usdc = find_token(&TOKEN_UNIVERSE, "USDC").unwrap().clone();
        let now = Utc::now();
        Opportunity {
            id: "test".to_string(),
            path: vec![SOL, usdc.clone(), SOL],
            legs: vec![],
            input_lamports: 1_000_000_000,
            expected_return_lamports: 1_050_000_000,
            gross_profit_lamports: 50_000_000,
            estimated_cost_lamports: 20_000_000,
            net_profit_lamports: 30_000_000,
            net_profit_usd: dec!(4.50),
            confidence: 0.7,
            risk_level: RiskLevel::Low,
            created_at: now,
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    #[test]
    fn expiry_is_checked_against_wall_clock() {
        assert!(!sample_opportunity(30).is_expired());
        assert!(sample_opportunity(-1).is_expired());
    }

    #[test]
    fn route_display_reads_in_path_order() {
        assert_eq!(sample_opportunity(30).route_display(), "SOL→USDC→SOL");
    }
}
