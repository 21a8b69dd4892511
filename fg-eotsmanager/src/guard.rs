//! Persists `(fp_pk, chain_id, height) -> msg_hash` *before* a signature is
//! released, per spec.md §5 and §9: "no signature is released before the
//! guard row is durable." A crash between guard-flush and signature-release
//! is safe (replay refuses); the reverse is catastrophic.

use std::sync::Arc;

use fg_types::FpPubKey;
use redb::{Database, ReadableTable, TableDefinition};
use sha3::{Digest, Sha3_256};

use crate::error::EotsError;

const GUARD_TABLE: TableDefinition<'_, &str, [u8; 32]> = TableDefinition::new("doublesign_guard");

fn guard_key(fp_pk: &FpPubKey, chain_id: &str, height: u64) -> String {
    format!("{}/{chain_id}/{height}", fp_pk.to_hex())
}

fn msg_hash(msg: &[u8]) -> [u8; 32] {
    Sha3_256::digest(msg).into()
}

struct Db {
    inner: Database,
}

impl Db {
    fn open(path: &std::path::Path) -> Result<Self, EotsError> {
        let inner = Database::create(path)?;
        let write_txn = inner.begin_write()?;
        {
            write_txn.open_table(GUARD_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { inner })
    }

    fn in_memory() -> Self {
        let inner = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .expect("in-memory redb backend never fails to create");
        let write_txn = inner.begin_write().unwrap();
        {
            write_txn.open_table(GUARD_TABLE).unwrap();
        }
        write_txn.commit().unwrap();
        Self { inner }
    }

    /// Returns `Ok(true)` if this is the first signature at this key (guard
    /// row written, msg accepted); `Ok(false)` if a *different* message was
    /// already signed at this key.
    fn check_and_set(&self, key: &str, hash: [u8; 32]) -> Result<bool, EotsError> {
        let write_txn = self.inner.begin_write()?;
        let accepted = {
            let mut table = write_txn.open_table(GUARD_TABLE)?;
            let existing_hash = table.get(key)?.map(|existing| existing.value());
            match existing_hash {
                Some(existing) if existing == hash => true,
                Some(_) => false,
                None => {
                    table.insert(key, hash)?;
                    true
                }
            }
        };
        write_txn.commit()?;
        Ok(accepted)
    }
}

/// Async-facing wrapper, following the teacher's `Db`/`Store` split:
/// synchronous redb calls run inside `spawn_blocking` so the guard never
/// blocks an async task's executor thread.
#[derive(Clone)]
pub struct DoubleSignGuard {
    db: Arc<Db>,
}

impl DoubleSignGuard {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, EotsError> {
        Ok(Self {
            db: Arc::new(Db::open(path.as_ref())?),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            db: Arc::new(Db::in_memory()),
        }
    }

    /// Attempt to claim `(fp_pk, chain_id, height)` for `msg`. Returns an
    /// error if a different message was already signed at this key.
    pub async fn guard(
        &self,
        fp_pk: FpPubKey,
        chain_id: String,
        height: u64,
        msg: Vec<u8>,
    ) -> Result<(), EotsError> {
        let db = self.db.clone();
        let key = guard_key(&fp_pk, &chain_id, height);
        let hash = msg_hash(&msg);

        let accepted = tokio::task::spawn_blocking(move || db.check_and_set(&key, hash)).await??;

        if accepted {
            Ok(())
        } else {
            Err(EotsError::DoubleSignAttempt {
                fp_pk: fp_pk.to_hex(),
                chain_id,
                height,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_signature_at_a_height_is_accepted() {
        let guard = DoubleSignGuard::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        assert!(guard
            .guard(fp_pk, "chain-1".into(), 42, b"hash-a".to_vec())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn replaying_the_same_message_is_idempotent() {
        let guard = DoubleSignGuard::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        guard
            .guard(fp_pk, "chain-1".into(), 42, b"hash-a".to_vec())
            .await
            .unwrap();
        assert!(guard
            .guard(fp_pk, "chain-1".into(), 42, b"hash-a".to_vec())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn s3_double_sign_guard_rejects_a_different_message() {
        let guard = DoubleSignGuard::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        guard
            .guard(fp_pk, "chain-1".into(), 42, b"hash-a".to_vec())
            .await
            .unwrap();

        let result = guard
            .guard(fp_pk, "chain-1".into(), 42, b"hash-b".to_vec())
            .await;

        assert!(matches!(result, Err(EotsError::DoubleSignAttempt { .. })));
    }

    #[tokio::test]
    async fn guard_is_scoped_per_chain_id() {
        let guard = DoubleSignGuard::in_memory();
        let fp_pk = FpPubKey([1u8; 32]);
        guard
            .guard(fp_pk, "chain-1".into(), 42, b"hash-a".to_vec())
            .await
            .unwrap();
        assert!(guard
            .guard(fp_pk, "chain-2".into(), 42, b"hash-b".to_vec())
            .await
            .is_ok());
    }
}
