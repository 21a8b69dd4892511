use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use fg_consumer::{ConsumerError, TxSigner};

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_hash: String,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: u64,
}

/// `TxSigner` backed by an external signing sidecar reachable over HTTP.
///
/// Account-sequence tracking and Cosmos SDK tx encoding stay out of this
/// binary: `fg-consumer`'s `TxSigner` seam (spec.md §9) is designed for
/// exactly this kind of injection, and operators who already run a remote
/// signer for their validator key reuse it here instead of duplicating key
/// custody.
pub struct SidecarTxSigner {
    http: Client,
    signer_url: Url,
}

impl SidecarTxSigner {
    pub fn new(signer_url: Url) -> Self {
        Self {
            http: Client::new(),
            signer_url,
        }
    }
}

#[async_trait]
impl TxSigner for SidecarTxSigner {
    async fn broadcast_execute(
        &self,
        contract: &str,
        messages: Vec<serde_json::Value>,
    ) -> Result<String, ConsumerError> {
        let url = self
            .signer_url
            .join("broadcast")
            .map_err(|e| ConsumerError::Decode(e.to_string()))?;

        let response: BroadcastResponse = self
            .http
            .post(url)
            .json(&json!({ "contract": contract, "messages": messages }))
            .send()
            .await?
            .error_for_status()
            .map_err(ConsumerError::Transport)?
            .json()
            .await?;

        Ok(response.tx_hash)
    }

    async fn account_balance(&self) -> Result<u64, ConsumerError> {
        let url = self
            .signer_url
            .join("balance")
            .map_err(|e| ConsumerError::Decode(e.to_string()))?;

        let response: BalanceResponse = self.http.get(url).send().await?.json().await?;
        Ok(response.balance)
    }
}
