//! Token universe and categories

use lazy_static::lazy_static;
use serde::Serialize;

/// Liquidity/volatility category of a token, assigned statically per token.
/// Volatile tokens carry a pricing buffer in the evaluator and force the
/// HIGH risk classification regardless of margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenCategory {
    Stable,
    Major,
    Volatile,
}

impl TokenCategory {
    /// Static heuristic used to rank 4-hop candidates before truncation.
    /// Deeper books quote tighter and fail less.
    pub fn liquidity_weight(&self) -> u32 {
        match self {
            TokenCategory::Stable => 3,
            TokenCategory::Major => 2,
            TokenCategory::Volatile => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub mint: &'static str,
    pub decimals: u8,
    pub category: TokenCategory,
}

impl TokenInfo {
    pub const fn new(
        symbol: &'static str,
        mint: &'static str,
        decimals: u8,
        category: TokenCategory,
    ) -> Self {
        Self {
            symbol,
            mint,
            decimals,
            category,
        }
    }

    pub fn is_volatile(&self) -> bool {
        self.category == TokenCategory::Volatile
    }
}

pub const SOL: TokenInfo = TokenInfo::new(
    "SOL",
    "So11111111111111111111111111111111111111112",
    9,
    TokenCategory::Major,
);

lazy_static! {
    /// Tokens the cycle generator is allowed to route through. Kept small on
    /// purpose: every entry multiplies the candidate count and the quote load.
    pub static ref TOKEN_UNIVERSE: Vec<TokenInfo> = vec![
        SOL,
        TokenInfo::new(
            "USDC",
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            6,
            TokenCategory::Stable,
        ),
        TokenInfo::new(
            "USDT",
            "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
            6,
            TokenCategory::Stable,
        ),
        TokenInfo::new(
            "mSOL",
            "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So",
            9,
            TokenCategory::Major,
        ),
        TokenInfo::new(
            "JUP",
            "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN",
            6,
            TokenCategory::Major,
        ),
        TokenInfo::new(
            "RAY",
            "4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R",
            6,
            TokenCategory::Volatile,
        ),
        TokenInfo::new(
            "BONK",
            "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
            5,
            TokenCategory::Volatile,
        ),
        TokenInfo::new(
            "WIF",
            "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm",
            6,
            TokenCategory::Volatile,
        ),
    ];

    /// Hand-maintained 5-hop routes. Long cycles are not enumerated; they are
    /// curated, since the search space and the quote cost explode with depth.
    pub static ref CURATED_FIVE_HOP: Vec<Vec<&'static str>> = vec![
        vec!["SOL", "USDC", "JUP", "USDT", "SOL"],
        vec!["SOL", "mSOL", "USDC", "USDT", "SOL"],
        vec!["SOL", "USDC", "mSOL", "JUP", "SOL"],
    ];
}

/// Look a token up by symbol in the given universe.
pub fn find_token<'a>(tokens: &'a [TokenInfo], symbol: &str) -> Option<&'a TokenInfo> {
    tokens.iter().find(|t| t.symbol == symbol)
}
