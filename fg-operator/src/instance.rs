use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use caches::lru::AdaptiveCache;
use caches::Cache;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use fg_consumer::ConsumerController;
use fg_eotsmanager::EotsManager;
use fg_store::{FpStore, PubRandStore};
use fg_types::{
    BlockInfo, CriticalError, FinalityProvider, FpPubKey, FpStatus, MerkleTree, PubRandCommit,
    PubRandProof, Vote,
};

use crate::config::FpInstanceConfig;
use crate::error::OperatorError;
use crate::metrics::OperatorMetrics;

const MAX_QUEUED_BLOCKS: usize = 10_000;

struct SharedFeed {
    queue: Mutex<VecDeque<BlockInfo>>,
    tip: AtomicU64,
}

/// The FP Instance (C6): two cooperative loops wrapped around the
/// keystore (C1), pub-rand store (C2), FP record store (C3), and consumer
/// controller (C5), per spec.md §4.1.
pub struct FpInstance {
    fp_pk: FpPubKey,
    config: FpInstanceConfig,
    eots: Arc<EotsManager>,
    fp_store: FpStore,
    pubrand_store: PubRandStore,
    consumer: Arc<dyn ConsumerController>,
    metrics: OperatorMetrics,
    critical_tx: mpsc::Sender<CriticalError>,
    feed: Arc<SharedFeed>,
    power_cache: Mutex<AdaptiveCache<u64, bool>>,
}

impl FpInstance {
    pub fn new(
        fp_pk: FpPubKey,
        config: FpInstanceConfig,
        eots: Arc<EotsManager>,
        fp_store: FpStore,
        pubrand_store: PubRandStore,
        consumer: Arc<dyn ConsumerController>,
        metrics: OperatorMetrics,
        critical_tx: mpsc::Sender<CriticalError>,
    ) -> Self {
        let power_cache = AdaptiveCache::new(config.power_cache_size)
            .expect("power cache size must be nonzero");
        Self {
            fp_pk,
            config,
            eots,
            fp_store,
            pubrand_store,
            consumer,
            metrics,
            critical_tx,
            feed: Arc::new(SharedFeed {
                queue: Mutex::new(VecDeque::new()),
                tip: AtomicU64::new(0),
            }),
            power_cache: Mutex::new(power_cache),
        }
    }

    /// Spawns the feeder (drains `blocks` into shared state), the
    /// randomness-commitment loop, and the signature-submission loop.
    pub fn spawn(self: Arc<Self>, blocks: mpsc::Receiver<BlockInfo>) {
        let feeder = self.clone();
        tokio::spawn(async move { feeder.feed_loop(blocks).await });

        let commitment = self.clone();
        tokio::spawn(async move { commitment.commitment_loop().await });

        let signature = self.clone();
        tokio::spawn(async move { signature.signature_loop().await });
    }

    async fn feed_loop(&self, mut blocks: mpsc::Receiver<BlockInfo>) {
        while let Some(block) = blocks.recv().await {
            self.feed.tip.fetch_max(block.height, Ordering::SeqCst);
            let mut queue = self.feed.queue.lock().expect("feed queue mutex poisoned");
            if queue.len() >= MAX_QUEUED_BLOCKS {
                queue.pop_front();
            }
            queue.push_back(block);
        }
    }

    async fn raise_critical(&self, message: impl Into<String>) {
        self.metrics.inc_critical_errors();
        let _ = self
            .critical_tx
            .send(CriticalError {
                fp_pk: self.fp_pk,
                message: message.into(),
            })
            .await;
    }

    /// Loop A: randomness commitment (spec.md §4.1, §4.1.1).
    async fn commitment_loop(&self) {
        let mut ticker = tokio::time::interval(self.config.randomness_commit_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(error) = self.maybe_commit_randomness().await {
                use fg_types::Classify;
                match error.kind() {
                    fg_types::ErrorKind::Unrecoverable => {
                        self.raise_critical(error.to_string()).await;
                    }
                    _ => tracing::warn!(fp_pk = %self.fp_pk, %error, "commitment tick failed, retrying next tick"),
                }
            }
        }
    }

    async fn maybe_commit_randomness(&self) -> Result<(), OperatorError> {
        let fp = self.load_or_init_fp().await?;
        let tip = self.feed.tip.load(Ordering::SeqCst);
        let horizon = fp.last_commit_end_height();

        let should_commit =
            horizon == 0 || tip + self.config.min_rand_height_gap >= horizon;
        if !should_commit {
            return Ok(());
        }

        let start_height = [
            tip + 1,
            horizon + 1,
            self.config.finality_activation_height,
        ]
        .into_iter()
        .max()
        .expect("nonempty");

        let num = self.config.num_pub_rand;
        let leaves = self.eots.create_randomness_pair_list(
            self.fp_pk,
            &self.config.passphrase,
            &self.config.chain_id,
            start_height,
            num,
        )?;

        let tree = MerkleTree::new(&leaves);
        let commitment = tree.root();

        let sig_msg = commit_sign_message(&self.config.chain_id, start_height, num, &commitment);
        let signature = self
            .eots
            .sign_schnorr(self.fp_pk, &self.config.passphrase, &sig_msg)?;

        let proofs: Vec<PubRandProof> = leaves
            .iter()
            .enumerate()
            .map(|(i, pub_rand)| PubRandProof {
                fp_pk: self.fp_pk,
                height: start_height + i as u64,
                pub_rand: *pub_rand,
                proof: tree.proof(i).expect("index within leaves"),
            })
            .collect();
        self.pubrand_store.put_all(proofs).await?;

        self.consumer
            .commit_pub_rand_list(self.fp_pk, start_height, num, commitment, signature.serialize())
            .await?;

        let mut fp = fp;
        fp.last_commit_end_height = start_height + num;
        self.fp_store.put(fp).await?;
        self.metrics.inc_commits_submitted();
        Ok(())
    }

    /// Loop B: signature submission (spec.md §4.1, §4.1.2, §4.1.3).
    async fn signature_loop(&self) {
        let mut ticker = tokio::time::interval(self.config.signature_submission_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(error) = self.submit_pending_votes().await {
                use fg_types::Classify;
                match error.kind() {
                    fg_types::ErrorKind::Unrecoverable => {
                        self.raise_critical(error.to_string()).await;
                    }
                    fg_types::ErrorKind::Jailed => {
                        tracing::debug!(fp_pk = %self.fp_pk, "instance jailed, signature loop quiescent");
                    }
                    _ => tracing::warn!(fp_pk = %self.fp_pk, %error, "signature tick failed, retrying next tick"),
                }
            }
        }
    }

    async fn submit_pending_votes(&self) -> Result<(), OperatorError> {
        let batch = self.drain_batch();
        if batch.is_empty() {
            return Ok(());
        }

        let mut fp = self.load_or_init_fp().await?;
        if fp.status == FpStatus::Jailed {
            return Err(OperatorError::Jailed(self.fp_pk));
        }

        let batch_target_height = batch.last().expect("nonempty").height;
        let Some(commit) = self.consumer.query_last_public_rand_commit(self.fp_pk).await? else {
            return Ok(());
        };
        if commit.end_height() < batch_target_height {
            // Commitment loop hasn't caught up; re-tick.
            return Ok(());
        }

        let votes = self.filter_and_build_votes(&mut fp, &batch, &commit).await?;
        if votes.is_empty() {
            self.fp_store.put(fp).await?;
            return Ok(());
        }

        self.submit_with_retry(votes, &mut fp, batch_target_height).await?;
        self.fp_store.put(fp).await?;
        Ok(())
    }

    fn drain_batch(&self) -> Vec<BlockInfo> {
        let mut queue = self.feed.queue.lock().expect("feed queue mutex poisoned");
        let n = self.config.batch_submission_size.min(queue.len());
        queue.drain(..n).collect()
    }

    async fn filter_and_build_votes(
        &self,
        fp: &mut FinalityProvider,
        batch: &[BlockInfo],
        commit: &PubRandCommit,
    ) -> Result<Vec<Vote>, OperatorError> {
        let mut votes = Vec::new();
        let mut skipped = 0u64;
        let mut last_had_power = false;

        for block in batch {
            if block.height <= fp.last_voted_height {
                skipped += 1;
                continue;
            }
            if !commit.covers(block.height) {
                skipped += 1;
                continue;
            }

            let has_power = self.fp_has_power_cached(block.height).await?;
            last_had_power = has_power;
            if !has_power {
                skipped += 1;
                continue;
            }

            let Some(proof) = self.pubrand_store.get(self.fp_pk, block.height).await? else {
                skipped += 1;
                continue;
            };

            let eots_sig = self
                .eots
                .sign_eots(
                    self.fp_pk,
                    &self.config.passphrase,
                    &self.config.chain_id,
                    &block.hash.0,
                    block.height,
                )
                .await?;

            votes.push(Vote {
                fp_pk: self.fp_pk,
                height: block.height,
                block_hash: block.hash,
                pub_rand: proof.pub_rand,
                merkle_proof: proof.proof,
                eots_sig,
            });
        }

        if skipped > 0 {
            self.metrics.inc_votes_skipped(skipped);
        }

        if last_had_power && fp.status != FpStatus::Active {
            fp.status = FpStatus::Active;
        } else if !last_had_power && fp.status == FpStatus::Active {
            fp.status = FpStatus::Inactive;
        }
        self.metrics.set_status(&self.fp_pk.to_hex(), fp.status);

        Ok(votes)
    }

    async fn fp_has_power_cached(&self, height: u64) -> Result<bool, OperatorError> {
        if let Some(cached) = self.power_cache.lock().expect("power cache mutex poisoned").get(&height) {
            return Ok(*cached);
        }
        let has_power = self.consumer.query_fp_has_power(self.fp_pk, height).await?;
        self.power_cache
            .lock()
            .expect("power cache mutex poisoned")
            .put(height, has_power);
        Ok(has_power)
    }

    async fn submit_with_retry(
        &self,
        votes: Vec<Vote>,
        fp: &mut FinalityProvider,
        target_height: u64,
    ) -> Result<(), OperatorError> {
        use fg_types::Classify;

        let mut attempt = 0u32;
        let mut delay = self.config.submission_retry.initial_delay;
        let n = votes.len() as u64;

        loop {
            match self.consumer.submit_batch_finality_sigs(votes.clone()).await {
                Ok(_) => {
                    fp.advance_voted_height(target_height);
                    self.metrics.inc_votes_submitted(n);
                    return Ok(());
                }
                Err(error) => match error.kind() {
                    fg_types::ErrorKind::Unrecoverable | fg_types::ErrorKind::Jailed => {
                        return Err(error.into());
                    }
                    fg_types::ErrorKind::Expected => return Ok(()),
                    fg_types::ErrorKind::Retryable | fg_types::ErrorKind::Configuration => {
                        attempt += 1;
                        if attempt >= self.config.submission_retry.max_attempts {
                            return Err(OperatorError::RetriesExhausted(attempt));
                        }
                        tracing::warn!(fp_pk = %self.fp_pk, %error, attempt, "submission retry");
                        tokio::time::sleep(delay).await;
                        delay = self.config.submission_retry.next_delay(delay);

                        if self.consumer.query_is_block_finalized(target_height).await.unwrap_or(false) {
                            tracing::info!(fp_pk = %self.fp_pk, target_height, "block finalized by others during retry wait, bailing out");
                            return Ok(());
                        }
                    }
                },
            }
        }
    }

    async fn load_or_init_fp(&self) -> Result<FinalityProvider, OperatorError> {
        if let Some(fp) = self.fp_store.get(self.fp_pk).await? {
            return Ok(fp);
        }
        let consumer_id = self.consumer.query_consumer_id().await.unwrap_or_default();
        let fp = FinalityProvider::new(self.fp_pk, self.config.chain_id.clone(), consumer_id);
        self.fp_store.put(fp.clone()).await?;
        Ok(fp)
    }
}

/// The message an FP signs with its Schnorr key over a commitment window,
/// per spec.md §3: `(chain_id, start_height, num_pub_rand, commitment)`.
fn commit_sign_message(chain_id: &str, start_height: u64, num_pub_rand: u64, commitment: &[u8; 32]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(chain_id.len() + 16 + 32);
    msg.extend_from_slice(chain_id.as_bytes());
    msg.extend_from_slice(&start_height.to_be_bytes());
    msg.extend_from_slice(&num_pub_rand.to_be_bytes());
    msg.extend_from_slice(commitment);
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_consumer::mock::MockConsumerController;
    use fg_eotsmanager::{DoubleSignGuard, EotsManager, MemoryKeyRing};
    use std::time::Duration;

    fn test_instance() -> (
        Arc<FpInstance>,
        FpPubKey,
        mpsc::Receiver<CriticalError>,
        Arc<MockConsumerController>,
    ) {
        test_instance_with(|_config| {})
    }

    fn test_instance_with(
        configure: impl FnOnce(&mut FpInstanceConfig),
    ) -> (
        Arc<FpInstance>,
        FpPubKey,
        mpsc::Receiver<CriticalError>,
        Arc<MockConsumerController>,
    ) {
        let eots = Arc::new(EotsManager::new(Arc::new(MemoryKeyRing::new()), DoubleSignGuard::in_memory()));
        let fp_pk = eots.create_key("fp1", "pw", "m/0").unwrap();
        let consumer = Arc::new(MockConsumerController::new());
        let (critical_tx, critical_rx) = mpsc::channel(8);
        let mut config = FpInstanceConfig::default();
        config.passphrase = "pw".to_string();
        config.randomness_commit_interval = Duration::from_millis(10);
        config.signature_submission_interval = Duration::from_millis(10);
        configure(&mut config);

        let instance = Arc::new(FpInstance::new(
            fp_pk,
            config,
            eots,
            FpStore::in_memory(),
            PubRandStore::in_memory(),
            consumer.clone() as Arc<dyn ConsumerController>,
            OperatorMetrics::noop(),
            critical_tx,
        ));
        (instance, fp_pk, critical_rx, consumer)
    }

    #[tokio::test]
    async fn bootstrap_commit_is_issued_when_horizon_is_zero() {
        let (instance, _fp_pk, _rx, _consumer) = test_instance();
        instance.maybe_commit_randomness().await.unwrap();
        let fp = instance.fp_store.get(instance.fp_pk).await.unwrap().unwrap();
        assert!(fp.last_commit_end_height > 0);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let (instance, _fp_pk, _rx, _consumer) = test_instance();
        instance.submit_pending_votes().await.unwrap();
    }

    #[tokio::test]
    async fn non_empty_batch_is_voted_and_submitted() {
        let (instance, fp_pk, _rx, consumer) =
            test_instance_with(|config| config.num_pub_rand = 5);

        // Populate the pub-rand window (heights 1..=5) and advance the
        // commitment horizon before any blocks arrive.
        instance.maybe_commit_randomness().await.unwrap();

        for height in 1..=3u64 {
            consumer.set_power(fp_pk, height, true);
            instance.feed.queue.lock().unwrap().push_back(BlockInfo {
                height,
                hash: fg_types::BlockHash([height as u8; 32]),
                finalized: false,
                timestamp: height,
            });
        }
        instance.feed.tip.store(3, std::sync::atomic::Ordering::SeqCst);

        instance.submit_pending_votes().await.unwrap();

        let fp = instance.fp_store.get(fp_pk).await.unwrap().unwrap();
        assert_eq!(fp.last_voted_height, 3);

        for height in 1..=3u64 {
            let hash = fg_types::BlockHash([height as u8; 32]);
            let voters = consumer.query_block_voters(height, hash).await.unwrap();
            assert_eq!(voters, vec![fp_pk]);
        }
    }
}
