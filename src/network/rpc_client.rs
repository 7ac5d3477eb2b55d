//! Ledger JSON-RPC client used as the priority-fee sample source

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;
use crate::errors::{BotError, BotResult};
use crate::network::interfaces::FeeSampleSource;

const RPC_REQUEST_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFee {
    prioritization_fee: u64,
}

pub struct RpcClient {
    client: reqwest::Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: &str) -> BotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RPC_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BotError::Network {
                message: "Failed to build RPC HTTP client".to_string(),
                source: Some(e.into()),
                retry_count: 0,
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl FeeSampleSource for RpcClient {
    async fn recent_priority_fees(&self) -> BotResult<Vec<u64>> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getRecentPrioritizationFees",
            "params": [[]],
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network {
                message: "getRecentPrioritizationFees request failed".to_string(),
                source: Some(e.into()),
                retry_count: 0,
            })?;

        if response.status().as_u16() == 429 {
            return Err(BotError::RateLimited {
                message: "RPC returned 429".to_string(),
                retry_after: None,
            });
        }

        let parsed: RpcResponse<Vec<PrioritizationFee>> =
            response.json().await.map_err(|e| BotError::DataParsing {
                context: "getRecentPrioritizationFees response".to_string(),
                source: e.into(),
            })?;

        if let Some(err) = parsed.error {
            // -32005 is the node's own throttling code.
            if err.code == -32005 {
                return Err(BotError::RateLimited {
                    message: err.message,
                    retry_after: None,
                });
            }
            warn!("RPC error {}: {}", err.code, err.message);
            return Err(BotError::Network {
                message: format!("RPC error {}: {}", err.code, err.message),
                source: None,
                retry_count: 0,
            });
        }

        Ok(parsed
            .result
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.prioritization_fee)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_fee_samples() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"result":[
                    {"slot":100,"prioritizationFee":0},
                    {"slot":101,"prioritizationFee":12000},
                    {"slot":102,"prioritizationFee":3500}
                ]}"#,
            )
            .create_async()
            .await;

        let client = RpcClient::new(&server.url()).unwrap();
        let fees = client.recent_priority_fees().await.unwrap();
        assert_eq!(fees, vec![0, 12_000, 3_500]);
    }

    #[tokio::test]
    async fn surfaces_node_throttling_as_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"requests per second exceeded"}}"#,
            )
            .create_async()
            .await;

        let client = RpcClient::new(&server.url()).unwrap();
        let err = client.recent_priority_fees().await.unwrap_err();
        assert!(err.is_rate_limited());
    }
}
