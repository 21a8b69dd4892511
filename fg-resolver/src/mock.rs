//! In-memory test doubles for [`crate::traits::BabylonQuery`] and
//! [`crate::traits::BtcOracle`], in the style of `fg_consumer::mock`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use fg_types::{FpPubKey, PowerMap};

use crate::error::ResolverError;
use crate::traits::{BabylonQuery, BtcOracle};

#[derive(Default)]
struct BabylonModel {
    fp_pks: Vec<FpPubKey>,
    powers: HashMap<u32, PowerMap>,
    earliest_active_height: u32,
}

pub struct MockBabylonQuery {
    model: Mutex<BabylonModel>,
}

impl Default for MockBabylonQuery {
    fn default() -> Self {
        Self {
            model: Mutex::new(BabylonModel::default()),
        }
    }
}

impl MockBabylonQuery {
    pub fn set_fp_pks(&self, pks: Vec<FpPubKey>) {
        self.model.lock().expect("lock poisoned").fp_pks = pks;
    }

    pub fn set_power(&self, btc_height: u32, powers: PowerMap) {
        self.model.lock().expect("lock poisoned").powers.insert(btc_height, powers);
    }

    pub fn set_earliest_active_height(&self, height: u32) {
        self.model.lock().expect("lock poisoned").earliest_active_height = height;
    }
}

#[async_trait]
impl BabylonQuery for MockBabylonQuery {
    async fn query_all_fp_btc_pubkeys(&self, _consumer_id: &str) -> Result<Vec<FpPubKey>, ResolverError> {
        Ok(self.model.lock().expect("lock poisoned").fp_pks.clone())
    }

    async fn multi_fp_power(&self, fp_pks: &[FpPubKey], btc_height: u32) -> Result<PowerMap, ResolverError> {
        let model = self.model.lock().expect("lock poisoned");
        let Some(all) = model.powers.get(&btc_height) else {
            return Ok(PowerMap::new());
        };
        Ok(fp_pks
            .iter()
            .filter_map(|pk| all.get(pk).map(|power| (*pk, *power)))
            .collect())
    }

    async fn earliest_active_delegation_btc_height(&self, _fp_pks: &[FpPubKey]) -> Result<u32, ResolverError> {
        Ok(self.model.lock().expect("lock poisoned").earliest_active_height)
    }
}

#[derive(Default)]
pub struct MockBtcOracle {
    heights_by_timestamp: Mutex<HashMap<u64, u32>>,
}

impl MockBtcOracle {
    pub fn set_height(&self, timestamp: u64, btc_height: u32) {
        self.heights_by_timestamp
            .lock()
            .expect("lock poisoned")
            .insert(timestamp, btc_height);
    }
}

#[async_trait]
impl BtcOracle for MockBtcOracle {
    async fn btc_height_by_timestamp(&self, timestamp: u64) -> Result<u32, ResolverError> {
        self.heights_by_timestamp
            .lock()
            .expect("lock poisoned")
            .get(&timestamp)
            .copied()
            .ok_or_else(|| ResolverError::BtcOracle(format!("no btc height for timestamp {timestamp}")))
    }
}
