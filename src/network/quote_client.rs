//! HTTP client for the aggregator quote API

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use async_trait::async_trait;
use tracing::warn;
use crate::errors::{BotError, BotResult};
use crate::network::interfaces::{QuoteService, SwapQuote};

const QUOTE_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Wire format of the aggregator's /quote response. Amounts arrive as
/// decimal strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    input_mint: String,
    in_amount: String,
    output_mint: String,
    out_amount: String,
    #[serde(default)]
    price_impact_pct: Option<String>,
    #[serde(default)]
    route_plan: Vec<RoutePlanStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutePlanStep {
    swap_info: SwapInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapInfo {
    label: Option<String>,
    fee_amount: String,
}

pub struct HttpQuoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuoteClient {
    pub fn new(base_url: &str) -> BotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(QUOTE_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BotError::Network {
                message: "Failed to build HTTP client".to_string(),
                source: Some(e.into()),
                retry_count: 0,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn parse_amount(raw: &str, field: &str) -> BotResult<u64> {
        raw.parse::<u64>().map_err(|e| BotError::DataParsing {
            context: format!("quote field {field}: {raw:?}"),
            source: e.into(),
        })
    }
}

#[async_trait]
impl QuoteService for HttpQuoteClient {
    async fn quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        in_amount: u64,
        max_slippage_bps: u16,
    ) -> BotResult<SwapQuote> {
        let url = format!(
            "{}/quote?inputMint={}&outputMint={}&amount={}&slippageBps={}",
            self.base_url, input_mint, output_mint, in_amount, max_slippage_bps
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("quote HTTP request failed")
            .map_err(|e| BotError::Network {
                message: format!("quote request {input_mint} -> {output_mint}"),
                source: Some(e),
                retry_count: 0,
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(BotError::RateLimited {
                message: "quote API returned 429".to_string(),
                retry_after,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Quote API error {} for {}->{}: {}", status, input_mint, output_mint, body);
            return Err(BotError::QuoteUnavailable {
                input_mint: input_mint.to_string(),
                output_mint: output_mint.to_string(),
                message: format!("HTTP {status}: {body}"),
                source: None,
            });
        }

        let parsed: QuoteResponse =
            response.json().await.map_err(|e| BotError::DataParsing {
                context: "quote response body".to_string(),
                source: e.into(),
            })?;

        let out_amount = Self::parse_amount(&parsed.out_amount, "outAmount")?;
        if out_amount == 0 {
            return Err(BotError::QuoteUnavailable {
                input_mint: input_mint.to_string(),
                output_mint: output_mint.to_string(),
                message: "aggregator returned zero output".to_string(),
                source: None,
            });
        }

        // Route fees are reported per hop in the fee mint's atomic units;
        // summed here as a uniform lamport-scale cost input.
        let mut route_fee_lamports = 0u64;
        let mut route_labels = Vec::with_capacity(parsed.route_plan.len());
        for step in &parsed.route_plan {
            route_fee_lamports = route_fee_lamports
                .saturating_add(Self::parse_amount(&step.swap_info.fee_amount, "feeAmount")?);
            if let Some(label) = &step.swap_info.label {
                route_labels.push(label.clone());
            }
        }

        Ok(SwapQuote {
            input_mint: parsed.input_mint,
            output_mint: parsed.output_mint,
            in_amount: Self::parse_amount(&parsed.in_amount, "inAmount")?,
            out_amount,
            route_labels,
            route_fee_lamports,
            price_impact_pct: parsed
                .price_impact_pct
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok())
                .unwrap_or_default(),
            slippage_bps: max_slippage_bps,
        })
    }
}
