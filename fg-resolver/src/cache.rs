use std::sync::Mutex;
use std::time::{Duration, Instant};

use caches::lru::AdaptiveCache;
use caches::Cache;

use fg_types::{BlockHash, BlockInfo, FpPubKey, PowerMap};

use crate::metrics::CacheMetrics;

/// Soft-eviction size shared by every layer, per spec.md §4.4.
const CACHE_MAP_COUNT: usize = 4096;

/// How long a refreshed `all_fp_pks` snapshot is trusted before the
/// background refresher (or an on-demand caller) must refetch it.
const ALL_FP_PKS_TTL: Duration = Duration::from_secs(4 * 60);

fn new_cache<K: std::hash::Hash + Eq, V>() -> AdaptiveCache<K, V> {
    AdaptiveCache::new(CACHE_MAP_COUNT).expect("CACHE_MAP_COUNT is a valid cache size")
}

fn pks_cache_key(pks: &[FpPubKey]) -> String {
    let mut hexes: Vec<String> = pks.iter().map(FpPubKey::to_hex).collect();
    hexes.sort();
    hexes.join(",")
}

struct AllFpPksSlot {
    pks: Vec<FpPubKey>,
    refreshed_at: Instant,
}

/// The seven write-on-read cache layers the resolver (C8) keeps in front of
/// the L2 RPC client, the consumer controller, and the Babylon/BTC queries,
/// following the teacher's `ValidatedPayloadCache` (`app/src/payload.rs`):
/// a small owning wrapper around `caches::lru::AdaptiveCache`, locked for
/// shared access instead of requiring `&mut self`.
pub struct ResolverCache {
    l2_block: Mutex<AdaptiveCache<u64, BlockInfo>>,
    finalized: Mutex<AdaptiveCache<u64, ()>>,
    btc_height_by_timestamp: Mutex<AdaptiveCache<BlockHash, u32>>,
    earliest_active_del_btc_height: Mutex<AdaptiveCache<String, u32>>,
    multi_fp_power: Mutex<AdaptiveCache<u32, PowerMap>>,
    voted_fp_pks: Mutex<AdaptiveCache<BlockHash, Vec<FpPubKey>>>,
    all_fp_pks: Mutex<Option<AllFpPksSlot>>,
    metrics: CacheMetrics,
}

impl ResolverCache {
    pub fn new(metrics: CacheMetrics) -> Self {
        Self {
            l2_block: Mutex::new(new_cache()),
            finalized: Mutex::new(new_cache()),
            btc_height_by_timestamp: Mutex::new(new_cache()),
            earliest_active_del_btc_height: Mutex::new(new_cache()),
            multi_fp_power: Mutex::new(new_cache()),
            voted_fp_pks: Mutex::new(new_cache()),
            all_fp_pks: Mutex::new(None),
            metrics,
        }
    }

    pub fn get_l2_block(&self, height: u64) -> Option<BlockInfo> {
        let mut cache = self.l2_block.lock().expect("lock poisoned");
        let hit = cache.get(&height).copied();
        self.record("l2_block", hit.is_some());
        hit
    }

    pub fn put_l2_block(&self, height: u64, block: BlockInfo) {
        self.l2_block.lock().expect("lock poisoned").put(height, block);
    }

    pub fn is_finalized_cached(&self, height: u64) -> bool {
        let mut cache = self.finalized.lock().expect("lock poisoned");
        let hit = cache.get(&height).is_some();
        self.record("finalized", hit);
        hit
    }

    /// Only successful finalizations are ever recorded; there is no
    /// `mark_not_finalized` because that verdict can change as staking
    /// power or voters shift.
    pub fn mark_finalized(&self, height: u64) {
        self.finalized.lock().expect("lock poisoned").put(height, ());
    }

    pub fn get_btc_height_by_timestamp(&self, block_hash: BlockHash) -> Option<u32> {
        let mut cache = self.btc_height_by_timestamp.lock().expect("lock poisoned");
        let hit = cache.get(&block_hash).copied();
        self.record("btc_height_by_timestamp", hit.is_some());
        hit
    }

    pub fn put_btc_height_by_timestamp(&self, block_hash: BlockHash, btc_height: u32) {
        self.btc_height_by_timestamp
            .lock()
            .expect("lock poisoned")
            .put(block_hash, btc_height);
    }

    pub fn get_earliest_active_del_btc_height(&self, pks: &[FpPubKey]) -> Option<u32> {
        let key = pks_cache_key(pks);
        let mut cache = self.earliest_active_del_btc_height.lock().expect("lock poisoned");
        let hit = cache.get(&key).copied();
        self.record("earliest_active_del_btc_height", hit.is_some());
        hit
    }

    pub fn put_earliest_active_del_btc_height(&self, pks: &[FpPubKey], height: u32) {
        let key = pks_cache_key(pks);
        self.earliest_active_del_btc_height
            .lock()
            .expect("lock poisoned")
            .put(key, height);
    }

    pub fn get_multi_fp_power(&self, btc_height: u32) -> Option<PowerMap> {
        let mut cache = self.multi_fp_power.lock().expect("lock poisoned");
        let hit = cache.get(&btc_height).cloned();
        self.record("multi_fp_power", hit.is_some());
        hit
    }

    pub fn put_multi_fp_power(&self, btc_height: u32, powers: PowerMap) {
        self.multi_fp_power.lock().expect("lock poisoned").put(btc_height, powers);
    }

    pub fn get_voted_fp_pks(&self, block_hash: BlockHash) -> Option<Vec<FpPubKey>> {
        let mut cache = self.voted_fp_pks.lock().expect("lock poisoned");
        let hit = cache.get(&block_hash).cloned();
        self.record("voted_fp_pks", hit.is_some());
        hit
    }

    pub fn put_voted_fp_pks(&self, block_hash: BlockHash, voters: Vec<FpPubKey>) {
        self.voted_fp_pks.lock().expect("lock poisoned").put(block_hash, voters);
    }

    /// Returns the cached `all_fp_pks` snapshot if it is still within
    /// [`ALL_FP_PKS_TTL`], per spec.md §4.4's "refreshed ... every ~4
    /// minutes and on demand when stale".
    pub fn get_all_fp_pks(&self) -> Option<Vec<FpPubKey>> {
        let slot = self.all_fp_pks.lock().expect("lock poisoned");
        let hit = slot
            .as_ref()
            .filter(|s| s.refreshed_at.elapsed() < ALL_FP_PKS_TTL)
            .map(|s| s.pks.clone());
        self.record("all_fp_pks", hit.is_some());
        hit
    }

    pub fn set_all_fp_pks(&self, pks: Vec<FpPubKey>) {
        *self.all_fp_pks.lock().expect("lock poisoned") = Some(AllFpPksSlot {
            pks,
            refreshed_at: Instant::now(),
        });
    }

    fn record(&self, layer: &str, hit: bool) {
        if hit {
            self.metrics.hit(layer);
        } else {
            self.metrics.miss(layer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(b: u8) -> FpPubKey {
        FpPubKey([b; 32])
    }

    #[test]
    fn l2_block_cache_round_trips() {
        let cache = ResolverCache::new(CacheMetrics::noop());
        assert!(cache.get_l2_block(10).is_none());
        let block = BlockInfo {
            height: 10,
            hash: BlockHash([1u8; 32]),
            finalized: false,
            timestamp: 100,
        };
        cache.put_l2_block(10, block);
        assert_eq!(cache.get_l2_block(10), Some(block));
    }

    #[test]
    fn finalized_cache_is_one_shot_presence() {
        let cache = ResolverCache::new(CacheMetrics::noop());
        assert!(!cache.is_finalized_cached(5));
        cache.mark_finalized(5);
        assert!(cache.is_finalized_cached(5));
    }

    #[test]
    fn pks_cache_key_is_order_independent() {
        assert_eq!(
            pks_cache_key(&[pk(1), pk(2)]),
            pks_cache_key(&[pk(2), pk(1)]),
        );
    }

    #[test]
    fn all_fp_pks_cache_expires() {
        let cache = ResolverCache::new(CacheMetrics::noop());
        assert!(cache.get_all_fp_pks().is_none());
        cache.set_all_fp_pks(vec![pk(1)]);
        assert_eq!(cache.get_all_fp_pks(), Some(vec![pk(1)]));
    }
}
