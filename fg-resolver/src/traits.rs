use async_trait::async_trait;

use fg_types::{FpPubKey, PowerMap};

use crate::error::ResolverError;

/// A read-only view onto the Babylon control chain's staking state: the set
/// of FPs registered for a consumer chain, their BTC-delegation power at a
/// given BTC height, and the earliest BTC height any of them had an active
/// delegation (spec.md §4.4's staking-activation gate).
#[async_trait]
pub trait BabylonQuery: Send + Sync {
    async fn query_all_fp_btc_pubkeys(&self, consumer_id: &str) -> Result<Vec<FpPubKey>, ResolverError>;

    async fn multi_fp_power(&self, fp_pks: &[FpPubKey], btc_height: u32) -> Result<PowerMap, ResolverError>;

    async fn earliest_active_delegation_btc_height(&self, fp_pks: &[FpPubKey]) -> Result<u32, ResolverError>;
}

/// Maps an L2 block timestamp to the corresponding Bitcoin block height, the
/// anchor the resolver uses to decide which BTC-staking snapshot governs a
/// given L2 block (spec.md §4.4).
#[async_trait]
pub trait BtcOracle: Send + Sync {
    async fn btc_height_by_timestamp(&self, timestamp: u64) -> Result<u32, ResolverError>;
}
