//! Lamport and decimal conversion helpers

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

pub fn pow10(n: i32) -> Decimal {
    match n {
        0 => dec!(1),
        6 => dec!(1_000_000),
        9 => dec!(1_000_000_000),
        _ => {
            let mut result = dec!(1);
            if n > 0 {
                for _ in 0..n {
                    result *= dec!(10);
                }
            } else {
                for _ in 0..(-n) {
                    result /= dec!(10);
                }
            }
            result
        }
    }
}

pub fn lamports_to_sol(lamports: i64) -> Decimal {
    Decimal::from(lamports) / pow10(9)
}

pub fn lamports_to_usd(lamports: i64, sol_price_usd: Decimal) -> Decimal {
    lamports_to_sol(lamports) * sol_price_usd
}

pub fn sol_to_lamports(sol: Decimal) -> u64 {
    (sol * pow10(9)).to_u64().unwrap_or(0)
}
