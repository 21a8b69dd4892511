use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use fg_types::{BlockHash, BlockInfo, FpPubKey, PubRandCommit, Vote};

use crate::controller::ConsumerController;
use crate::error::ConsumerError;
use crate::metrics::GasMetrics;
use crate::msgs::{
    BlockResponse, CommitPublicRandomnessBody, ConfigResponse, ExecuteMsg, PubRandCommitResponse,
    QueryMsg, SubmitFinalitySignatureBody,
};

const QUERY_TIMEOUT: Duration = Duration::from_secs(20);

/// Signs and broadcasts a Cosmos SDK transaction bundling one or more
/// `MsgExecuteContract`s. Kept as a narrow seam so the controller's HTTP
/// plumbing doesn't need to know about account sequences or amino/protobuf
/// tx encoding — that's a signer concern, injected at construction.
#[async_trait]
pub trait TxSigner: Send + Sync {
    async fn broadcast_execute(
        &self,
        contract: &str,
        messages: Vec<serde_json::Value>,
    ) -> Result<String, ConsumerError>;

    async fn account_balance(&self) -> Result<u64, ConsumerError>;
}

/// Thin CosmWasm client (C5): translates typed operations into
/// `MsgExecuteContract` payloads and typed queries into
/// `QuerySmartContractStateRequest`, following the `reqwest`-over-JSON
/// shape of the teacher's `EngineRPC::rpc_request`.
pub struct CosmWasmController {
    http: Client,
    rest_url: Url,
    contract_addr: String,
    signer: std::sync::Arc<dyn TxSigner>,
    metrics: GasMetrics,
}

impl CosmWasmController {
    pub fn new(
        rest_url: Url,
        contract_addr: impl Into<String>,
        signer: std::sync::Arc<dyn TxSigner>,
        metrics: GasMetrics,
    ) -> Self {
        Self {
            http: Client::new(),
            rest_url,
            contract_addr: contract_addr.into(),
            signer,
            metrics,
        }
    }

    async fn query<D: DeserializeOwned>(&self, msg: &QueryMsg) -> Result<D, ConsumerError> {
        let query_b64 = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            serde_json::to_vec(msg).map_err(|e| ConsumerError::Decode(e.to_string()))?,
        );
        let url = self.rest_url.join(&format!(
            "/cosmwasm/wasm/v1/contract/{}/smart/{query_b64}",
            self.contract_addr
        ))
        .expect("contract address and query are URL-safe once base64-encoded");

        let response = self
            .http
            .get(url)
            .timeout(QUERY_TIMEOUT)
            .send()
            .await
            .map_err(ConsumerError::Transport)?;

        let body: serde_json::Value = response.json().await.map_err(ConsumerError::Transport)?;

        if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
            return Err(ConsumerError::Contract(message.to_string()));
        }

        let data = body
            .get("data")
            .cloned()
            .ok_or_else(|| ConsumerError::Decode("missing `data` field".to_string()))?;

        serde_json::from_value(data).map_err(|e| ConsumerError::Decode(e.to_string()))
    }

    async fn execute(&self, msg: ExecuteMsg) -> Result<String, ConsumerError> {
        let value = serde_json::to_value(&msg).map_err(|e| ConsumerError::Decode(e.to_string()))?;
        let tx_hash = self
            .signer
            .broadcast_execute(&self.contract_addr, vec![value])
            .await?;

        if let Ok(balance) = self.signer.account_balance().await {
            self.metrics.observe_balance(balance);
        }

        Ok(tx_hash)
    }
}

#[async_trait]
impl ConsumerController for CosmWasmController {
    async fn commit_pub_rand_list(
        &self,
        fp_pk: FpPubKey,
        start_height: u64,
        num_pub_rand: u64,
        commitment: [u8; 32],
        signature: [u8; 64],
    ) -> Result<String, ConsumerError> {
        let msg = ExecuteMsg::CommitPublicRandomness(CommitPublicRandomnessBody {
            fp_pubkey_hex: fp_pk.to_hex(),
            start_height,
            num_pub_rand,
            commitment: format!("0x{}", hex::encode(commitment)),
            signature: format!("0x{}", hex::encode(signature)),
        });
        self.execute(msg).await
    }

    async fn submit_batch_finality_sigs(
        &self,
        votes: Vec<Vote>,
    ) -> Result<String, ConsumerError> {
        let mut messages = Vec::with_capacity(votes.len());
        for vote in votes {
            let msg = ExecuteMsg::SubmitFinalitySignature(SubmitFinalitySignatureBody {
                fp_pubkey_hex: vote.fp_pk.to_hex(),
                height: vote.height,
                pub_rand: format!("0x{}", hex::encode(vote.pub_rand)),
                proof: (&vote.merkle_proof).into(),
                block_hash: vote.block_hash.to_hex_0x(),
                signature: format!("0x{}", hex::encode(vote.eots_sig)),
            });
            messages.push(serde_json::to_value(&msg).map_err(|e| ConsumerError::Decode(e.to_string()))?);
        }

        let tx_hash = self
            .signer
            .broadcast_execute(&self.contract_addr, messages)
            .await?;

        if let Ok(balance) = self.signer.account_balance().await {
            self.metrics.observe_balance(balance);
        }

        Ok(tx_hash)
    }

    async fn query_last_public_rand_commit(
        &self,
        fp_pk: FpPubKey,
    ) -> Result<Option<PubRandCommit>, ConsumerError> {
        let msg = QueryMsg::LastPubRandCommit {
            btc_pk_hex: fp_pk.to_hex(),
        };
        let response: Option<PubRandCommitResponse> = self.query(&msg).await.unwrap_or(None);
        let Some(response) = response else {
            return Ok(None);
        };
        let commitment_hex = response.commitment.strip_prefix("0x").unwrap_or(&response.commitment);
        let mut commitment = [0u8; 32];
        hex::decode_to_slice(commitment_hex, &mut commitment)
            .map_err(|e| ConsumerError::Decode(e.to_string()))?;
        Ok(Some(PubRandCommit {
            fp_pk,
            start_height: response.start_height,
            num_pub_rand: response.num_pub_rand,
            commitment,
            signature: [0u8; 64],
        }))
    }

    async fn query_latest_finalized_block(&self) -> Result<Option<BlockInfo>, ConsumerError> {
        let response: Option<BlockResponse> =
            self.query(&QueryMsg::LatestFinalizedBlock {}).await.unwrap_or(None);
        response
            .map(|r| {
                Ok(BlockInfo {
                    height: r.height,
                    hash: BlockHash::from_hex(&r.hash).map_err(|e| ConsumerError::Decode(e.to_string()))?,
                    finalized: r.finalized,
                    timestamp: 0,
                })
            })
            .transpose()
    }

    async fn query_is_block_finalized(&self, height: u64) -> Result<bool, ConsumerError> {
        self.query(&QueryMsg::IsBlockFinalized { height }).await
    }

    async fn query_fp_has_power(
        &self,
        fp_pk: FpPubKey,
        height: u64,
    ) -> Result<bool, ConsumerError> {
        self.query(&QueryMsg::FpHasPower {
            fp_pubkey_hex: fp_pk.to_hex(),
            height,
        })
        .await
    }

    async fn query_block_voters(
        &self,
        height: u64,
        hash: BlockHash,
    ) -> Result<Vec<FpPubKey>, ConsumerError> {
        let msg = QueryMsg::BlockVoters {
            height,
            hash: hash.to_hex_0x(),
        };
        let voters: Vec<String> = self.query(&msg).await?;
        voters
            .iter()
            .map(|v| FpPubKey::from_hex(v).map_err(|e| ConsumerError::Decode(e.to_string())))
            .collect()
    }

    async fn query_is_enabled(&self) -> Result<bool, ConsumerError> {
        self.query(&QueryMsg::IsEnabled {}).await
    }

    async fn query_consumer_id(&self) -> Result<String, ConsumerError> {
        let response: ConfigResponse = self.query(&QueryMsg::Config {}).await?;
        Ok(response.consumer_id)
    }

    async fn query_activated_height(&self) -> Result<u64, ConsumerError> {
        let response: ConfigResponse = self.query(&QueryMsg::Config {}).await?;
        Ok(response.activated_height)
    }
}
