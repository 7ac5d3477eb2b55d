//! Confidence and risk scoring for priced cycles

use crate::types::{RiskLevel, TokenInfo};

const CONFIDENCE_BASE: f64 = 0.5;
const CONFIDENCE_FLOOR: f64 = 0.05;
const CONFIDENCE_CEILING: f64 = 0.95;

/// Confidence in a priced cycle. Fewer hops score higher (each hop is an
/// independent latency and slippage risk) and fatter margins score higher.
/// Clamped below certainty on both ends: every quote is a point-in-time
/// estimate.
pub fn confidence_score(hop_count: usize, net_profit_lamports: i64, estimated_cost_lamports: u64) -> f64 {
    let hop_bonus = match hop_count {
        0..=3 => 0.2,
        4 => 0.1,
        5 => 0.05,
        _ => 0.0,
    };

    let margin_bonus = (margin_over_cost(net_profit_lamports, estimated_cost_lamports) * 0.1)
        .min(0.25)
        .max(0.0);

    (CONFIDENCE_BASE + hop_bonus + margin_bonus).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

/// Volatile or thin-liquidity intermediates are HIGH risk no matter how fat
/// the margin looks; otherwise risk falls as the margin grows.
pub fn classify_risk(
    path: &[TokenInfo],
    net_profit_lamports: i64,
    estimated_cost_lamports: u64,
) -> RiskLevel {
    let touches_volatile = path
        .iter()
        .skip(1)
        .take(path.len().saturating_sub(2))
        .any(|t| t.is_volatile());
    if touches_volatile {
        return RiskLevel::High;
    }

    let ratio = margin_over_cost(net_profit_lamports, estimated_cost_lamports);
    if ratio >= 3.0 {
        RiskLevel::UltraLow
    } else if ratio >= 1.5 {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

fn margin_over_cost(net_profit_lamports: i64, estimated_cost_lamports: u64) -> f64 {
    if estimated_cost_lamports == 0 {
        return 0.0;
    }
    net_profit_lamports.max(0) as f64 / estimated_cost_lamports as f64
}
