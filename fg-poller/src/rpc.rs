use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::PollerError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct JsonRequestBody {
    jsonrpc: &'static str,
    method: &'static str,
    params: serde_json::Value,
    id: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonResponseBody {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct EthBlock {
    pub number: String,
    pub hash: String,
    pub timestamp: String,
}

/// Unauthenticated L2 JSON-RPC client, following the request/response shape
/// of the engine-RPC client this repo's teacher uses for its execution
/// client, minus JWT bearer auth (an L2 read-only RPC endpoint needs none).
pub struct L2RpcClient {
    http: Client,
    url: Url,
}

impl L2RpcClient {
    pub fn new(url: Url) -> Self {
        Self {
            http: Client::new(),
            url,
        }
    }

    pub async fn rpc_request<D: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<D, PollerError> {
        let body = JsonRequestBody {
            jsonrpc: "2.0",
            method,
            params,
            id: json!(1),
        };
        let response: JsonResponseBody = self
            .http
            .post(self.url.clone())
            .timeout(DEFAULT_TIMEOUT)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(PollerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(response.result).map_err(|e| PollerError::Decode(e.to_string()))
    }

    pub async fn block_number(&self) -> Result<u64, PollerError> {
        let hex: String = self.rpc_request("eth_blockNumber", json!([])).await?;
        parse_quantity(&hex)
    }

    pub async fn get_block_by_number(
        &self,
        height: u64,
        finalized_tip: Option<u64>,
    ) -> Result<fg_types::BlockInfo, PollerError> {
        let tag = format!("0x{height:x}");
        let block: EthBlock = self
            .rpc_request("eth_getBlockByNumber", json!([tag, false]))
            .await?;

        let parsed_height = parse_quantity(&block.number)?;
        let hash = fg_types::BlockHash::from_hex(&block.hash)
            .map_err(|e| PollerError::Decode(e.to_string()))?;
        let timestamp = parse_quantity(&block.timestamp)?;

        Ok(fg_types::BlockInfo {
            height: parsed_height,
            hash,
            finalized: finalized_tip.is_some_and(|tip| parsed_height <= tip),
            timestamp,
        })
    }

    /// Forwards `eth_getBlockByNumber` to the upstream node unchanged,
    /// returning the raw JSON result rather than decoding it into
    /// [`fg_types::BlockInfo`]. Used by the operator RPC front-end (C9) for
    /// its passthrough path.
    pub async fn raw_get_block_by_number(
        &self,
        tag: &str,
        full_tx: bool,
    ) -> Result<serde_json::Value, PollerError> {
        self.rpc_request("eth_getBlockByNumber", json!([tag, full_tx])).await
    }
}

fn parse_quantity(hex: &str) -> Result<u64, PollerError> {
    let stripped = hex.strip_prefix("0x").unwrap_or(hex);
    u64::from_str_radix(stripped, 16).map_err(|e| PollerError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantity() {
        assert_eq!(parse_quantity("0x10").unwrap(), 16);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
    }
}
