//! Bot configuration settings and environment variable handling

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

// Trade sizing bounds
pub const MIN_TRADE_SIZE_SOL: Decimal = dec!(0.05);
pub const MAX_TRADE_SIZE_SOL: Decimal = dec!(50.0);
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

// Profit floors
pub const MIN_NET_PROFIT_LAMPORTS: u64 = 100_000; // 0.0001 SOL
pub const MIN_NET_PROFIT_USD: Decimal = dec!(0.01);

// Quote constraints
pub const MAX_SLIPPAGE_BPS: u16 = 300;
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;
pub const QUOTE_TTL_SECS: i64 = 15;

// Fixed per-signature ledger fee
pub const BASE_TX_FEE_LAMPORTS: u64 = 5_000;

// Pricing buffer applied when a cycle routes through a volatile token
pub const VOLATILITY_BUFFER_BPS: u64 = 25;

// Request scheduler defaults
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 8;
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 300;
pub const DEFAULT_BURST_LIMIT: u32 = 20;
pub const DEFAULT_BURST_WINDOW_SECS: u64 = 10;
pub const RATE_LIMIT_COOLDOWN_SECS: u64 = 5;

// Execution timing
pub const CONFIRMATION_POLL_INTERVAL_MS: u64 = 250;
pub const CONFIRMATION_TIMEOUT_MS: u64 = 8_000;
pub const BALANCE_POLL_ATTEMPTS: u32 = 10;
pub const BALANCE_POLL_DELAY_MS: u64 = 500;
pub const REVERSE_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub quote_api_url: String,
    pub rpc_url: Option<String>,
    pub signer_pubkey: String,
    pub trade_size_lamports: u64,
    pub min_net_profit_lamports: u64,
    pub min_net_profit_usd: Decimal,
    pub base_asset_price_usd: Decimal,
    pub max_slippage_bps: u16,
    // Request scheduler
    pub requests_per_second: u32,
    pub requests_per_minute: u32,
    pub burst_limit: u32,
    // Cycle generation
    pub four_hop_candidate_cap: usize,
    pub enable_four_hop: bool,
    pub enable_curated_routes: bool,
    // Execution
    pub enable_execution: bool,
    pub safety_buffer_lamports: u64,
    // Scan loop
    pub min_scan_delay_ms: u64,
    pub max_scan_delay_ms: u64,
    pub max_consecutive_errors: u32,
    pub circuit_breaker_cooldown_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        let trade_size_sol = env::var("TRADE_SIZE_SOL")
            .ok()
            .and_then(|s| Decimal::from_str(&s).ok())
            .unwrap_or(dec!(0.5))
            .max(MIN_TRADE_SIZE_SOL)
            .min(MAX_TRADE_SIZE_SOL);

        Self {
            quote_api_url: env::var("QUOTE_API_URL")
                .unwrap_or_else(|_| "https://quote-api.jup.ag/v6".to_string()),
            rpc_url: env::var("RPC_URL").ok(),
            signer_pubkey: env::var("SIGNER_PUBKEY")
                .unwrap_or_else(|_| "paper-wallet".to_string()),
            trade_size_lamports: (trade_size_sol
                * Decimal::from(LAMPORTS_PER_SOL))
                .to_u64()
                .unwrap_or(LAMPORTS_PER_SOL / 2),
            min_net_profit_lamports: env::var("MIN_NET_PROFIT_LAMPORTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MIN_NET_PROFIT_LAMPORTS)
                .max(MIN_NET_PROFIT_LAMPORTS),
            min_net_profit_usd: env::var("MIN_NET_PROFIT_USD")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(0.05))
                .max(MIN_NET_PROFIT_USD),
            base_asset_price_usd: env::var("SOL_PRICE_USD")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(dec!(150)),
            max_slippage_bps: env::var("MAX_SLIPPAGE_BPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SLIPPAGE_BPS)
                .min(MAX_SLIPPAGE_BPS),
            requests_per_second: env::var("REQUESTS_PER_SECOND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUESTS_PER_SECOND)
                .max(1),
            requests_per_minute: env::var("REQUESTS_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE)
                .max(1),
            burst_limit: env::var("BURST_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BURST_LIMIT)
                .max(1),
            four_hop_candidate_cap: env::var("FOUR_HOP_CANDIDATE_CAP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),
            enable_four_hop: env::var("ENABLE_FOUR_HOP")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            enable_curated_routes: env::var("ENABLE_CURATED_ROUTES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            enable_execution: env::var("ENABLE_EXECUTION")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            safety_buffer_lamports: env::var("SAFETY_BUFFER_LAMPORTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000_000), // 0.01 SOL headroom
            min_scan_delay_ms: env::var("MIN_SCAN_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2_000),
            max_scan_delay_ms: env::var("MAX_SCAN_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30_000),
            max_consecutive_errors: 5,
            circuit_breaker_cooldown_secs: 300, // 5 minutes
        }
    }
}
