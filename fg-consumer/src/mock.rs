//! In-memory test double for [`ConsumerController`], following the
//! `MockBtcRpc` pattern from the chainflip BTC deposit tracker: an
//! `async_trait` impl backed by a `Mutex`-guarded in-memory model instead of
//! a live contract.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use fg_types::{BlockHash, BlockInfo, FpPubKey, PubRandCommit, Vote};

use crate::controller::ConsumerController;
use crate::error::ConsumerError;

#[derive(Default)]
struct Model {
    commits: HashMap<FpPubKey, PubRandCommit>,
    powers: HashMap<(FpPubKey, u64), bool>,
    voters: HashMap<(u64, BlockHash), Vec<FpPubKey>>,
    finalized_heights: std::collections::HashSet<u64>,
    latest_finalized: Option<BlockInfo>,
    enabled: bool,
    consumer_id: String,
    activated_height: u64,
}

/// Test double standing in for the live CosmWasm contract.
pub struct MockConsumerController {
    model: Mutex<Model>,
}

impl Default for MockConsumerController {
    fn default() -> Self {
        Self {
            model: Mutex::new(Model {
                enabled: true,
                consumer_id: "test-consumer".to_string(),
                ..Default::default()
            }),
        }
    }
}

impl MockConsumerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_power(&self, fp_pk: FpPubKey, height: u64, has_power: bool) {
        self.model.lock().unwrap().powers.insert((fp_pk, height), has_power);
    }

    pub fn set_voters(&self, height: u64, hash: BlockHash, voters: Vec<FpPubKey>) {
        self.model.lock().unwrap().voters.insert((height, hash), voters);
    }

    pub fn mark_finalized(&self, height: u64) {
        self.model.lock().unwrap().finalized_heights.insert(height);
    }

    pub fn set_activated_height(&self, height: u64) {
        self.model.lock().unwrap().activated_height = height;
    }
}

#[async_trait]
impl ConsumerController for MockConsumerController {
    async fn commit_pub_rand_list(
        &self,
        fp_pk: FpPubKey,
        start_height: u64,
        num_pub_rand: u64,
        commitment: [u8; 32],
        signature: [u8; 64],
    ) -> Result<String, ConsumerError> {
        let mut model = self.model.lock().unwrap();
        if let Some(existing) = model.commits.get(&fp_pk) {
            if existing.start_height < start_height + num_pub_rand
                && start_height < existing.end_height()
            {
                return Err(ConsumerError::Duplicate(
                    "overlapping pub-rand window".to_string(),
                ));
            }
        }
        model.commits.insert(
            fp_pk,
            PubRandCommit {
                fp_pk,
                start_height,
                num_pub_rand,
                commitment,
                signature,
            },
        );
        Ok(format!("tx-commit-{fp_pk}-{start_height}"))
    }

    async fn submit_batch_finality_sigs(
        &self,
        votes: Vec<Vote>,
    ) -> Result<String, ConsumerError> {
        let mut model = self.model.lock().unwrap();
        for vote in &votes {
            if model.finalized_heights.contains(&vote.height) {
                return Err(ConsumerError::AlreadyFinalized);
            }
            let entry = model
                .voters
                .entry((vote.height, vote.block_hash))
                .or_default();
            if !entry.contains(&vote.fp_pk) {
                entry.push(vote.fp_pk);
            }
        }
        Ok(format!("tx-submit-{}", votes.len()))
    }

    async fn query_last_public_rand_commit(
        &self,
        fp_pk: FpPubKey,
    ) -> Result<Option<PubRandCommit>, ConsumerError> {
        Ok(self.model.lock().unwrap().commits.get(&fp_pk).cloned())
    }

    async fn query_latest_finalized_block(&self) -> Result<Option<BlockInfo>, ConsumerError> {
        Ok(self.model.lock().unwrap().latest_finalized)
    }

    async fn query_is_block_finalized(&self, height: u64) -> Result<bool, ConsumerError> {
        Ok(self.model.lock().unwrap().finalized_heights.contains(&height))
    }

    async fn query_fp_has_power(
        &self,
        fp_pk: FpPubKey,
        height: u64,
    ) -> Result<bool, ConsumerError> {
        Ok(self
            .model
            .lock()
            .unwrap()
            .powers
            .get(&(fp_pk, height))
            .copied()
            .unwrap_or(false))
    }

    async fn query_block_voters(
        &self,
        height: u64,
        hash: BlockHash,
    ) -> Result<Vec<FpPubKey>, ConsumerError> {
        Ok(self
            .model
            .lock()
            .unwrap()
            .voters
            .get(&(height, hash))
            .cloned()
            .unwrap_or_default())
    }

    async fn query_is_enabled(&self) -> Result<bool, ConsumerError> {
        Ok(self.model.lock().unwrap().enabled)
    }

    async fn query_consumer_id(&self) -> Result<String, ConsumerError> {
        Ok(self.model.lock().unwrap().consumer_id.clone())
    }

    async fn query_activated_height(&self) -> Result<u64, ConsumerError> {
        Ok(self.model.lock().unwrap().activated_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commit_then_query_reports_same_window() {
        let controller = MockConsumerController::new();
        let fp_pk = FpPubKey([1u8; 32]);
        controller
            .commit_pub_rand_list(fp_pk, 101, 1000, [2u8; 32], [3u8; 64])
            .await
            .unwrap();

        let commit = controller
            .query_last_public_rand_commit(fp_pk)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(commit.start_height, 101);
        assert_eq!(commit.num_pub_rand, 1000);
    }

    #[tokio::test]
    async fn overlapping_commit_window_is_rejected() {
        let controller = MockConsumerController::new();
        let fp_pk = FpPubKey([1u8; 32]);
        controller
            .commit_pub_rand_list(fp_pk, 100, 50, [0u8; 32], [0u8; 64])
            .await
            .unwrap();

        let result = controller
            .commit_pub_rand_list(fp_pk, 120, 50, [0u8; 32], [0u8; 64])
            .await;
        assert!(matches!(result, Err(ConsumerError::Duplicate(_))));
    }

    #[tokio::test]
    async fn submitting_to_an_already_finalized_height_is_expected_error() {
        let controller = MockConsumerController::new();
        controller.mark_finalized(10);
        let vote = Vote {
            fp_pk: FpPubKey([1u8; 32]),
            height: 10,
            block_hash: BlockHash([0u8; 32]),
            pub_rand: [0u8; 32],
            merkle_proof: fg_types::MerkleProof {
                total: 1,
                index: 0,
                leaf_hash: vec![0u8; 32],
                aunts: vec![],
            },
            eots_sig: [0u8; 32],
        };
        let result = controller.submit_batch_finality_sigs(vec![vote]).await;
        assert!(matches!(result, Err(ConsumerError::AlreadyFinalized)));
    }
}
