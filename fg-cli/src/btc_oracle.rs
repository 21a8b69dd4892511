use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use fg_resolver::{BtcOracle, ResolverError};

#[derive(Deserialize)]
struct HeightByTimestampResponse {
    height: u32,
}

/// BTC oracle client (consulted by C8), mapping an L2 block timestamp to a
/// Bitcoin block height via a mempool-explorer-style HTTP API.
pub struct HttpBtcOracle {
    http: Client,
    base_url: Url,
}

impl HttpBtcOracle {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl BtcOracle for HttpBtcOracle {
    async fn btc_height_by_timestamp(&self, timestamp: u64) -> Result<u32, ResolverError> {
        let url = self
            .base_url
            .join(&format!("v1/blocks/timestamp/{timestamp}"))
            .map_err(|e| ResolverError::BtcOracle(e.to_string()))?;

        let response: HeightByTimestampResponse = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ResolverError::BtcOracle(e.to_string()))?
            .json()
            .await
            .map_err(|e| ResolverError::BtcOracle(e.to_string()))?;

        Ok(response.height)
    }
}
