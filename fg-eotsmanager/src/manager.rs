use std::sync::Arc;

use fg_types::FpPubKey;
use secp256k1::{schnorr, Keypair, Message, Secp256k1};
use sha3::Digest;

use crate::eots::eots_sign_scalar;
use crate::error::EotsError;
use crate::guard::DoubleSignGuard;
use crate::keyring::KeyRing;
use crate::randomness::{create_randomness_pair_list, derive_secret_randomness, public_randomness};

/// The EOTS keystore client (C1): derives per-height randomness, signs EOTS
/// and Schnorr messages, and refuses to re-sign a height under a different
/// message. See spec.md §4.2.
pub struct EotsManager {
    keyring: Arc<dyn KeyRing>,
    guard: DoubleSignGuard,
    secp: Secp256k1<secp256k1::All>,
}

impl EotsManager {
    pub fn new(keyring: Arc<dyn KeyRing>, guard: DoubleSignGuard) -> Self {
        Self {
            keyring,
            guard,
            secp: Secp256k1::new(),
        }
    }

    pub fn create_key(
        &self,
        name: &str,
        passphrase: &str,
        hd_path: &str,
    ) -> Result<FpPubKey, EotsError> {
        self.keyring.create_key(name, passphrase, hd_path)
    }

    /// Deterministic, idempotent: two calls with identical inputs return the
    /// identical list (spec.md §4.2, invariant 4 in §8).
    pub fn create_randomness_pair_list(
        &self,
        fp_pk: FpPubKey,
        passphrase: &str,
        chain_id: &str,
        start_height: u64,
        num: u64,
    ) -> Result<Vec<[u8; 32]>, EotsError> {
        let secret = self.keyring.secret_key(&fp_pk, passphrase)?;
        Ok(create_randomness_pair_list(
            &secret,
            fp_pk,
            chain_id,
            start_height,
            num,
        ))
    }

    /// `sign_eots`: guarded. Persists the guard row before returning the
    /// signature, per spec.md §9's durability ordering.
    pub async fn sign_eots(
        &self,
        fp_pk: FpPubKey,
        passphrase: &str,
        chain_id: &str,
        msg: &[u8],
        height: u64,
    ) -> Result<[u8; 32], EotsError> {
        self.guard
            .guard(fp_pk, chain_id.to_string(), height, msg.to_vec())
            .await?;

        self.unsafe_sign_eots(fp_pk, passphrase, chain_id, msg, height)
    }

    /// Guardless EOTS signing for test harnesses. Must never be called from
    /// the production submission path (spec.md §4.2).
    pub fn unsafe_sign_eots(
        &self,
        fp_pk: FpPubKey,
        passphrase: &str,
        chain_id: &str,
        msg: &[u8],
        height: u64,
    ) -> Result<[u8; 32], EotsError> {
        let secret = self.keyring.secret_key(&fp_pk, passphrase)?;
        let r = derive_secret_randomness(&secret, chain_id, height);
        let pub_rand = public_randomness(&r);

        Ok(eots_sign_scalar(
            &secret, &fp_pk, &r, &pub_rand, chain_id, height, msg,
        ))
    }

    pub fn sign_schnorr(
        &self,
        fp_pk: FpPubKey,
        passphrase: &str,
        msg: &[u8],
    ) -> Result<schnorr::Signature, EotsError> {
        let secret = self.keyring.secret_key(&fp_pk, passphrase)?;
        let keypair = Keypair::from_secret_key(&self.secp, &secret);
        let digest: [u8; 32] = sha3::Sha3_256::digest(msg).into();
        let message = Message::from_digest(digest);
        Ok(self.secp.sign_schnorr(&message, &keypair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::MemoryKeyRing;

    fn manager() -> EotsManager {
        EotsManager::new(Arc::new(MemoryKeyRing::new()), DoubleSignGuard::in_memory())
    }

    #[tokio::test]
    async fn sign_eots_then_resign_same_message_succeeds() {
        let mgr = manager();
        let fp_pk = mgr.create_key("fp1", "pw", "m/0").unwrap();
        let a = mgr
            .sign_eots(fp_pk, "pw", "chain-1", b"H", 42)
            .await
            .unwrap();
        let b = mgr
            .sign_eots(fp_pk, "pw", "chain-1", b"H", 42)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn s3_sign_eots_rejects_a_second_distinct_message_at_same_height() {
        let mgr = manager();
        let fp_pk = mgr.create_key("fp1", "pw", "m/0").unwrap();
        mgr.sign_eots(fp_pk, "pw", "chain-1", b"A", 42)
            .await
            .unwrap();

        let result = mgr.sign_eots(fp_pk, "pw", "chain-1", b"B", 42).await;
        assert!(matches!(result, Err(EotsError::DoubleSignAttempt { .. })));
    }

    #[test]
    fn create_randomness_pair_list_is_deterministic_across_calls() {
        let mgr = manager();
        let fp_pk = mgr.create_key("fp1", "pw", "m/0").unwrap();
        let a = mgr
            .create_randomness_pair_list(fp_pk, "pw", "chain-1", 100, 5)
            .unwrap();
        let b = mgr
            .create_randomness_pair_list(fp_pk, "pw", "chain-1", 100, 5)
            .unwrap();
        assert_eq!(a, b);
    }
}
