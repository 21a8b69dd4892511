use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use fg_types::{FinalityProvider, FpPubKey};
use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::metrics::DbMetrics;

const FP_TABLE: TableDefinition<'_, &str, Vec<u8>> = TableDefinition::new("fp");

struct Db {
    db: Database,
    metrics: DbMetrics,
}

impl Db {
    fn open(path: &Path, metrics: DbMetrics) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(FP_TABLE)?;
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
            write_txn.open_table(FP_TABLE).unwrap();
        }
        write_txn.commit().unwrap();
        Self { db, metrics }
    }

    fn get(&self, fp_pk: &FpPubKey) -> Result<Option<FinalityProvider>, StoreError> {
        let start = Instant::now();
        let tx = self.db.begin_read()?;
        let table = tx.open_table(FP_TABLE)?;
        let value = table.get(fp_pk.to_hex().as_str())?;
        let read_bytes = value.as_ref().map(|v| v.value().len() as u64);
        let result = value
            .map(|v| serde_json::from_slice::<FinalityProvider>(&v.value()))
            .transpose()?;
        if let Some(bytes) = read_bytes {
            self.metrics.add_read_bytes(bytes);
        }
        self.metrics.observe_read_time(start.elapsed());
        Ok(result)
    }

    fn put(&self, fp: &FinalityProvider) -> Result<(), StoreError> {
        let start = Instant::now();
        let bytes = serde_json::to_vec(fp)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(FP_TABLE)?;
            table.insert(fp.fp_pk.to_hex().as_str(), bytes)?;
        }
        write_txn.commit()?;
        self.metrics.observe_write_time(start.elapsed());
        Ok(())
    }

    fn all(&self) -> Result<Vec<FinalityProvider>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(FP_TABLE)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(&value.value())?);
        }
        Ok(out)
    }
}

/// Persists per-FP metadata (C3): address, BTC public key, status,
/// `last_voted_height`, chain-id — single writer per key, many readers
/// (spec.md §5).
#[derive(Clone)]
pub struct FpStore {
    db: Arc<Db>,
}

impl FpStore {
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

    pub async fn get(&self, fp_pk: FpPubKey) -> Result<Option<FinalityProvider>, StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.get(&fp_pk)).await?
    }

    pub async fn put(&self, fp: FinalityProvider) -> Result<(), StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.put(&fp)).await?
    }

    pub async fn all(&self) -> Result<Vec<FinalityProvider>, StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.all()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_types::FpStatus;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = FpStore::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        let fp = FinalityProvider::new(fp_pk, "chain-1", "bbn1abc");
        store.put(fp.clone()).await.unwrap();

        let loaded = store.get(fp_pk).await.unwrap().unwrap();
        assert_eq!(loaded.fp_pk, fp_pk);
        assert_eq!(loaded.status, FpStatus::Registered);
    }

    #[tokio::test]
    async fn get_unknown_fp_returns_none() {
        let store = FpStore::in_memory();
        assert!(store.get(FpPubKey([9u8; 32])).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_lists_every_inserted_record() {
        let store = FpStore::in_memory();
        for i in 0..3u8 {
            store
                .put(FinalityProvider::new(FpPubKey([i; 32]), "chain-1", "bbn1abc"))
                .await
                .unwrap();
        }
        assert_eq!(store.all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn persists_across_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fp.redb");
        let fp_pk = FpPubKey([2u8; 32]);
        {
            let store = FpStore::open(&path, DbMetrics::noop()).unwrap();
            store
                .put(FinalityProvider::new(fp_pk, "chain-1", "bbn1abc"))
                .await
                .unwrap();
        }
        let store = FpStore::open(&path, DbMetrics::noop()).unwrap();
        assert!(store.get(fp_pk).await.unwrap().is_some());
    }
}
