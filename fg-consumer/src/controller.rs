use async_trait::async_trait;

use fg_types::{BlockInfo, FpPubKey, PubRandCommit, Vote};

use crate::error::ConsumerError;

/// Contract-facing capability trait (C5). A single production implementation
/// (`CosmWasmController`) and one test double stand in for the deep
/// controller-wrapping-controller embedding in the source, per spec.md §9.
#[async_trait]
pub trait ConsumerController: Send + Sync {
    async fn commit_pub_rand_list(
        &self,
        fp_pk: FpPubKey,
        start_height: u64,
        num_pub_rand: u64,
        commitment: [u8; 32],
        signature: [u8; 64],
    ) -> Result<String, ConsumerError>;

    async fn submit_batch_finality_sigs(
        &self,
        votes: Vec<Vote>,
    ) -> Result<String, ConsumerError>;

    async fn query_last_public_rand_commit(
        &self,
        fp_pk: FpPubKey,
    ) -> Result<Option<PubRandCommit>, ConsumerError>;

    async fn query_latest_finalized_block(&self) -> Result<Option<BlockInfo>, ConsumerError>;

    async fn query_is_block_finalized(&self, height: u64) -> Result<bool, ConsumerError>;

    async fn query_fp_has_power(
        &self,
        fp_pk: FpPubKey,
        height: u64,
    ) -> Result<bool, ConsumerError>;

    async fn query_block_voters(
        &self,
        height: u64,
        hash: fg_types::BlockHash,
    ) -> Result<Vec<FpPubKey>, ConsumerError>;

    async fn query_is_enabled(&self) -> Result<bool, ConsumerError>;

    async fn query_consumer_id(&self) -> Result<String, ConsumerError>;

    async fn query_activated_height(&self) -> Result<u64, ConsumerError>;
}
