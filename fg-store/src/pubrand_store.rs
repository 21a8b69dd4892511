use std::path::Path;
use std::sync::Arc;

use fg_types::{FpPubKey, PubRandProof};
use redb::{Database, TableDefinition};

use crate::error::StoreError;
use crate::metrics::DbMetrics;

const PUBRAND_TABLE: TableDefinition<'_, &str, Vec<u8>> = TableDefinition::new("pubrand");

fn key(fp_pk: &FpPubKey, height: u64) -> String {
    format!("{}/{height}", fp_pk.to_hex())
}

struct Db {
    db: Database,
    metrics: DbMetrics,
}

impl Db {
    fn open(path: &Path, metrics: DbMetrics) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(PUBRAND_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db, metrics })
    }

    fn in_memory(metrics: DbMetrics) -> Self {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .expect("in-memory redb backend never fails to create");
        let write_txn = db.begin_write().unwrap();
        {
            write_txn.open_table(PUBRAND_TABLE).unwrap();
        }
        write_txn.commit().unwrap();
        Self { db, metrics }
    }

    fn put(&self, proof: &PubRandProof) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(proof)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PUBRAND_TABLE)?;
            table.insert(key(&proof.fp_pk, proof.height).as_str(), bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, fp_pk: &FpPubKey, height: u64) -> Result<Option<PubRandProof>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(PUBRAND_TABLE)?;
        let value = table.get(key(fp_pk, height).as_str())?;
        if let Some(v) = &value {
            self.metrics.add_read_bytes(v.value().len() as u64);
        }
        value
            .map(|v| serde_json::from_slice(&v.value()))
            .transpose()
            .map_err(StoreError::from)
    }
}

/// Persists per-leaf Merkle openings for committed randomness windows (C2).
/// Created when a commitment is sent; consumed read-only on each vote within
/// the window (spec.md §3).
#[derive(Clone)]
pub struct PubRandStore {
    db: Arc<Db>,
}

impl PubRandStore {
    pub fn open(path: impl AsRef<Path>, metrics: DbMetrics) -> Result<Self, StoreError> {
        Ok(Self {
            db: Arc::new(Db::open(path.as_ref(), metrics)?),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            db: Arc::new(Db::in_memory(DbMetrics::noop())),
        }
    }

    pub async fn put(&self, proof: PubRandProof) -> Result<(), StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.put(&proof)).await?
    }

    pub async fn put_all(&self, proofs: Vec<PubRandProof>) -> Result<(), StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            for proof in &proofs {
                db.put(proof)?;
            }
            Ok(())
        })
        .await?
    }

    pub async fn get(
        &self,
        fp_pk: FpPubKey,
        height: u64,
    ) -> Result<Option<PubRandProof>, StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.get(&fp_pk, height)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_types::MerkleProof;

    fn proof(fp_pk: FpPubKey, height: u64) -> PubRandProof {
        PubRandProof {
            fp_pk,
            height,
            pub_rand: [0u8; 32],
            proof: MerkleProof {
                total: 1,
                index: 0,
                leaf_hash: vec![0u8; 32],
                aunts: vec![],
            },
        }
    }

    #[tokio::test]
    async fn put_then_get_by_fp_and_height() {
        let store = PubRandStore::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        store.put(proof(fp_pk, 100)).await.unwrap();
        assert!(store.get(fp_pk, 100).await.unwrap().is_some());
        assert!(store.get(fp_pk, 101).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_all_persists_every_proof_in_a_window() {
        let store = PubRandStore::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        let proofs: Vec<_> = (100..105).map(|h| proof(fp_pk, h)).collect();
        store.put_all(proofs).await.unwrap();
        for h in 100..105 {
            assert!(store.get(fp_pk, h).await.unwrap().is_some());
        }
    }
}
