use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fg_consumer::ConsumerController;
use fg_poller::L2RpcClient;
use fg_types::{is_quorum, BlockInfo, FpPubKey, PowerMap};

use crate::cache::ResolverCache;
use crate::error::ResolverError;
use crate::metrics::CacheMetrics;
use crate::traits::{BabylonQuery, BtcOracle};

/// How far past the last known finalized height the tip search jumps before
/// falling back to binary search, per spec.md §4.4.
const FAST_SKIP: u64 = 256;

/// Derives Babylon-finalization for L2 blocks (C8): a per-block stake-weighted
/// vote decision plus a cached binary search for the current finalized tip.
pub struct FinalizationResolver {
    consumer: Arc<dyn ConsumerController>,
    babylon: Arc<dyn BabylonQuery>,
    btc_oracle: Arc<dyn BtcOracle>,
    l2: Arc<L2RpcClient>,
    cache: ResolverCache,
    consumer_id: String,
    last_finalized: AtomicU64,
}

impl FinalizationResolver {
    pub fn new(
        consumer: Arc<dyn ConsumerController>,
        babylon: Arc<dyn BabylonQuery>,
        btc_oracle: Arc<dyn BtcOracle>,
        l2: Arc<L2RpcClient>,
        consumer_id: impl Into<String>,
        metrics: CacheMetrics,
        last_finalized: u64,
    ) -> Self {
        Self {
            consumer,
            babylon,
            btc_oracle,
            l2,
            cache: ResolverCache::new(metrics),
            consumer_id: consumer_id.into(),
            last_finalized: AtomicU64::new(last_finalized),
        }
    }

    /// Decides whether `block` is Babylon-finalized, per spec.md §4.4's
    /// per-block quorum decision (`fg_types::is_quorum`): voted power must
    /// cover at least two-thirds of total power.
    ///
    /// Height 0 is trivially finalized. If the BTC height derived from
    /// `block.timestamp` predates any FP's earliest active delegation, the
    /// block is treated as not-yet-finalized rather than an error.
    pub async fn is_block_finalized(&self, block: &BlockInfo) -> Result<bool, ResolverError> {
        if block.height == 0 {
            return Ok(true);
        }
        if self.cache.is_finalized_cached(block.height) {
            return Ok(true);
        }

        let all_pks = self.all_fp_pks().await?;
        let btc_height = self.btc_height_for(block).await?;
        let earliest = self.earliest_active_height(&all_pks).await?;
        if btc_height < earliest {
            return Ok(false);
        }

        let powers = self.powers_at(&all_pks, btc_height).await?;
        let voters = self.voters_for(block).await?;

        let finalized = is_quorum(&voters, &powers);
        if finalized {
            self.cache.mark_finalized(block.height);
        }
        Ok(finalized)
    }

    /// Returns the highest L2 height currently known to be Babylon-finalized,
    /// raising the persisted lower bound monotonically. Implements the
    /// short-circuits and binary search of spec.md §4.4.
    pub async fn finalized_tip(&self) -> Result<u64, ResolverError> {
        let tip = self.l2.block_number().await?;
        let last = self.last_finalized.load(Ordering::SeqCst);

        if tip == last {
            return Ok(last);
        }
        if tip > 1 && self.is_height_finalized(tip - 1).await? {
            self.raise_last_finalized(tip - 1);
            return Ok(tip - 1);
        }

        let mut lo = last;
        if tip > last + FAST_SKIP {
            let candidate = tip - FAST_SKIP;
            if self.is_height_finalized(candidate).await? {
                lo = candidate;
            }
        }

        let mut hi = tip + 1;
        while lo + 1 < hi {
            let mid = lo + (hi - lo) / 2 + (hi - lo) % 2;
            if self.is_height_finalized(mid).await? {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        self.raise_last_finalized(lo);
        Ok(lo)
    }

    /// Forces an `all_fp_pks` refetch, bypassing the TTL. Used by the
    /// background refresher and by callers that observe a stale read.
    pub async fn refresh_all_fp_pks(&self) -> Result<Vec<FpPubKey>, ResolverError> {
        let pks = self.babylon.query_all_fp_btc_pubkeys(&self.consumer_id).await?;
        self.cache.set_all_fp_pks(pks.clone());
        Ok(pks)
    }

    /// Spawns the background task that keeps `all_fp_pks` warm every ~4
    /// minutes, per spec.md §4.4.
    pub fn spawn_all_fp_pks_refresher(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(4 * 60));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(error) = self.refresh_all_fp_pks().await {
                    tracing::warn!(%error, "failed to refresh all_fp_pks");
                }
            }
        })
    }

    async fn is_height_finalized(&self, height: u64) -> Result<bool, ResolverError> {
        if height == 0 {
            return Ok(true);
        }
        if self.cache.is_finalized_cached(height) {
            return Ok(true);
        }
        let block = self.get_block(height).await?;
        self.is_block_finalized(&block).await
    }

    async fn get_block(&self, height: u64) -> Result<BlockInfo, ResolverError> {
        if let Some(block) = self.cache.get_l2_block(height) {
            return Ok(block);
        }
        let block = self.l2.get_block_by_number(height, None).await?;
        self.cache.put_l2_block(height, block);
        Ok(block)
    }

    async fn all_fp_pks(&self) -> Result<Vec<FpPubKey>, ResolverError> {
        if let Some(pks) = self.cache.get_all_fp_pks() {
            return Ok(pks);
        }
        self.refresh_all_fp_pks().await
    }

    async fn btc_height_for(&self, block: &BlockInfo) -> Result<u32, ResolverError> {
        if let Some(height) = self.cache.get_btc_height_by_timestamp(block.hash) {
            return Ok(height);
        }
        let height = self.btc_oracle.btc_height_by_timestamp(block.timestamp).await?;
        self.cache.put_btc_height_by_timestamp(block.hash, height);
        Ok(height)
    }

    async fn earliest_active_height(&self, pks: &[FpPubKey]) -> Result<u32, ResolverError> {
        if let Some(height) = self.cache.get_earliest_active_del_btc_height(pks) {
            return Ok(height);
        }
        let height = self.babylon.earliest_active_delegation_btc_height(pks).await?;
        self.cache.put_earliest_active_del_btc_height(pks, height);
        Ok(height)
    }

    async fn powers_at(&self, pks: &[FpPubKey], btc_height: u32) -> Result<PowerMap, ResolverError> {
        if let Some(powers) = self.cache.get_multi_fp_power(btc_height) {
            return Ok(powers);
        }
        let powers = self.babylon.multi_fp_power(pks, btc_height).await?;
        self.cache.put_multi_fp_power(btc_height, powers.clone());
        Ok(powers)
    }

    /// `block.hash` is normalized to its bare hex form by `BlockHash`'s
    /// own (de)serialization before it ever reaches the contract query, so
    /// no "0x" stripping is needed here.
    async fn voters_for(&self, block: &BlockInfo) -> Result<Vec<FpPubKey>, ResolverError> {
        if let Some(voters) = self.cache.get_voted_fp_pks(block.hash) {
            return Ok(voters);
        }
        let voters = self.consumer.query_block_voters(block.height, block.hash).await?;
        self.cache.put_voted_fp_pks(block.hash, voters.clone());
        Ok(voters)
    }

    fn raise_last_finalized(&self, height: u64) {
        self.last_finalized.fetch_max(height, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_consumer::mock::MockConsumerController;
    use fg_types::BlockHash;

    use crate::mock::{MockBabylonQuery, MockBtcOracle};

    fn pk(b: u8) -> FpPubKey {
        FpPubKey([b; 32])
    }

    fn block(height: u64, ts: u64) -> BlockInfo {
        BlockInfo {
            height,
            hash: BlockHash([height as u8; 32]),
            finalized: false,
            timestamp: ts,
        }
    }

    fn resolver_fixture() -> (
        Arc<MockConsumerController>,
        Arc<MockBabylonQuery>,
        Arc<MockBtcOracle>,
    ) {
        (
            Arc::new(MockConsumerController::default()),
            Arc::new(MockBabylonQuery::default()),
            Arc::new(MockBtcOracle::default()),
        )
    }

    #[tokio::test]
    async fn quorum_of_two_thirds_power_finalizes_a_block() {
        let (consumer, babylon, btc) = resolver_fixture();
        let fp1 = pk(1);
        let fp2 = pk(2);
        babylon.set_fp_pks(vec![fp1, fp2]);
        babylon.set_earliest_active_height(0);
        let mut powers = PowerMap::new();
        powers.insert(fp1, 70);
        powers.insert(fp2, 30);
        babylon.set_power(500, powers);
        btc.set_height(1_000, 500);

        let b = block(10, 1_000);
        consumer.set_voters(10, b.hash, vec![fp1]);

        let resolver = FinalizationResolver::new(
            consumer,
            babylon,
            btc,
            Arc::new(L2RpcClient::new("http://127.0.0.1:0".parse().unwrap())),
            "rollup-1",
            CacheMetrics::noop(),
            0,
        );

        assert!(resolver.is_block_finalized(&b).await.unwrap());
    }

    #[tokio::test]
    async fn below_two_thirds_power_does_not_finalize() {
        let (consumer, babylon, btc) = resolver_fixture();
        let fp1 = pk(1);
        let fp2 = pk(2);
        babylon.set_fp_pks(vec![fp1, fp2]);
        babylon.set_earliest_active_height(0);
        let mut powers = PowerMap::new();
        powers.insert(fp1, 50);
        powers.insert(fp2, 50);
        babylon.set_power(500, powers);
        btc.set_height(1_000, 500);

        let b = block(10, 1_000);
        consumer.set_voters(10, b.hash, vec![fp1]);

        let resolver = FinalizationResolver::new(
            consumer,
            babylon,
            btc,
            Arc::new(L2RpcClient::new("http://127.0.0.1:0".parse().unwrap())),
            "rollup-1",
            CacheMetrics::noop(),
            0,
        );

        assert!(!resolver.is_block_finalized(&b).await.unwrap());
    }

    #[tokio::test]
    async fn btc_height_before_earliest_active_delegation_is_not_finalized() {
        let (consumer, babylon, btc) = resolver_fixture();
        let fp1 = pk(1);
        babylon.set_fp_pks(vec![fp1]);
        babylon.set_earliest_active_height(600);
        let mut powers = PowerMap::new();
        powers.insert(fp1, 100);
        babylon.set_power(500, powers);
        btc.set_height(1_000, 500);

        let b = block(10, 1_000);
        consumer.set_voters(10, b.hash, vec![fp1]);

        let resolver = FinalizationResolver::new(
            consumer,
            babylon,
            btc,
            Arc::new(L2RpcClient::new("http://127.0.0.1:0".parse().unwrap())),
            "rollup-1",
            CacheMetrics::noop(),
            0,
        );

        assert!(!resolver.is_block_finalized(&b).await.unwrap());
    }

    /// Binds a throwaway JSON-RPC server that answers every request with a
    /// fixed `eth_blockNumber` result, so `finalized_tip()`'s one genuine
    /// network call (the current L2 tip) resolves without a live L2 node.
    async fn spawn_tip_server(tip: u64) -> reqwest::Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let body = format!(r#"{{"jsonrpc":"2.0","id":1,"result":"0x{tip:x}"}}"#);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                tokio::spawn(async move {
                    use tokio::io::{AsyncReadExt, AsyncWriteExt};
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}").parse().unwrap()
    }

    fn resolver_with_tip_client(
        consumer: Arc<MockConsumerController>,
        babylon: Arc<MockBabylonQuery>,
        btc: Arc<MockBtcOracle>,
        l2_url: reqwest::Url,
        last_finalized: u64,
    ) -> FinalizationResolver {
        FinalizationResolver::new(
            consumer,
            babylon,
            btc,
            Arc::new(L2RpcClient::new(l2_url)),
            "rollup-1",
            CacheMetrics::noop(),
            last_finalized,
        )
    }

    #[tokio::test]
    async fn finalized_tip_short_circuits_when_tip_is_unchanged() {
        let (consumer, babylon, btc) = resolver_fixture();
        let l2_url = spawn_tip_server(5).await;
        let resolver = resolver_with_tip_client(consumer, babylon, btc, l2_url, 5);

        assert_eq!(resolver.finalized_tip().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn finalized_tip_short_circuits_when_tip_minus_one_is_finalized() {
        let (consumer, babylon, btc) = resolver_fixture();
        let l2_url = spawn_tip_server(10).await;
        let resolver = resolver_with_tip_client(consumer, babylon, btc, l2_url, 0);

        resolver.cache.mark_finalized(9);

        assert_eq!(resolver.finalized_tip().await.unwrap(), 9);
        assert_eq!(resolver.last_finalized.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn finalized_tip_binary_search_converges_to_the_correct_tip() {
        let (consumer, babylon, btc) = resolver_fixture();
        // No FP has power, so `is_block_finalized` returns false for any
        // height not explicitly pre-marked finalized in the cache.
        btc.set_height(1_000, 500);

        let l2_url = spawn_tip_server(40).await;
        let resolver = resolver_with_tip_client(consumer, babylon, btc, l2_url, 0);

        for height in 1..=40u64 {
            if height <= 37 {
                resolver.cache.mark_finalized(height);
            } else {
                resolver.cache.put_l2_block(height, block(height, 1_000));
            }
        }

        assert_eq!(resolver.finalized_tip().await.unwrap(), 37);
        assert_eq!(resolver.last_finalized.load(Ordering::SeqCst), 37);
    }

    #[tokio::test]
    async fn finalized_tip_fast_skip_raises_the_lower_bound() {
        let (consumer, babylon, btc) = resolver_fixture();
        btc.set_height(1_000, 500);

        let l2_url = spawn_tip_server(300).await;
        let resolver = resolver_with_tip_client(consumer, babylon, btc, l2_url, 0);

        // True finalized tip is 150; FAST_SKIP's candidate (300 - 256 = 44)
        // lands well inside the finalized range, so the lower bound jumps to
        // 44 before the binary search narrows the rest of the way.
        for height in 1..=300u64 {
            if height <= 150 {
                resolver.cache.mark_finalized(height);
            } else {
                resolver.cache.put_l2_block(height, block(height, 1_000));
            }
        }

        assert_eq!(resolver.finalized_tip().await.unwrap(), 150);
    }

    #[tokio::test]
    async fn height_zero_is_trivially_finalized() {
        let (consumer, babylon, btc) = resolver_fixture();
        let resolver = FinalizationResolver::new(
            consumer,
            babylon,
            btc,
            Arc::new(L2RpcClient::new("http://127.0.0.1:0".parse().unwrap())),
            "rollup-1",
            CacheMetrics::noop(),
            0,
        );
        assert!(resolver.is_block_finalized(&block(0, 0)).await.unwrap());
    }
}
