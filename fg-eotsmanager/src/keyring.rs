use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use fg_types::FpPubKey;
use rand::RngCore;
use secp256k1::{Keypair, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::error::EotsError;

/// Owns FP private key custody. One production implementation
/// (`FileKeyRing`), one in-memory test double, per spec.md §9's "single
/// production implementation, one test double" pattern.
pub trait KeyRing: Send + Sync {
    fn create_key(
        &self,
        name: &str,
        passphrase: &str,
        hd_path: &str,
    ) -> Result<FpPubKey, EotsError>;

    fn secret_key(&self, fp_pk: &FpPubKey, passphrase: &str) -> Result<SecretKey, EotsError>;
}

fn passphrase_key(name: &str, passphrase: &str) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(b"fg-eotsmanager/keyring/v1");
    hasher.update(name.as_bytes());
    hasher.update(passphrase.as_bytes());
    hasher.finalize().into()
}

struct StoredKey {
    name: String,
    passphrase_hash: [u8; 32],
    secret: SecretKey,
}

/// On-disk envelope for a single encrypted key. `name` is carried alongside
/// the ciphertext so a fresh process (empty in-memory cache) can still
/// re-derive the passphrase hash that was used to encrypt it.
#[derive(Serialize, Deserialize)]
struct KeyEnvelope {
    name: String,
    nonce: String,
    ciphertext: String,
}

/// Production keyring: AES-256-GCM-encrypted JSON blobs under the FP home
/// directory. The boundary (`KeyRing` trait) is what downstream code depends
/// on, not the cipher.
pub struct FileKeyRing {
    home: PathBuf,
    secp: Secp256k1<secp256k1::All>,
    cache: Mutex<HashMap<FpPubKey, StoredKey>>,
}

impl FileKeyRing {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            secp: Secp256k1::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn key_path(&self, fp_pk: &FpPubKey) -> PathBuf {
        self.home.join(format!("{}.key", fp_pk.to_hex()))
    }

    fn encrypt(secret: &SecretKey, passphrase_hash: &[u8; 32]) -> (Vec<u8>, Vec<u8>) {
        let cipher = Aes256Gcm::new_from_slice(passphrase_hash).expect("passphrase hash is 32 bytes");
        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, secret.secret_bytes().as_slice())
            .expect("AES-256-GCM encryption of a 32-byte secret never fails");
        (nonce_bytes.to_vec(), ciphertext)
    }

    fn decrypt(nonce: &[u8], ciphertext: &[u8], passphrase_hash: &[u8; 32]) -> Result<SecretKey, EotsError> {
        let cipher = Aes256Gcm::new_from_slice(passphrase_hash).expect("passphrase hash is 32 bytes");
        let nonce = Nonce::from_slice(nonce);
        let bytes = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| EotsError::BadPassphrase)?;
        SecretKey::from_slice(&bytes).map_err(EotsError::from)
    }

    fn persist(&self, fp_pk: &FpPubKey, name: &str, nonce: &[u8], ciphertext: &[u8]) -> Result<(), EotsError> {
        std::fs::create_dir_all(&self.home)?;
        let envelope = KeyEnvelope {
            name: name.to_string(),
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(ciphertext),
        };
        std::fs::write(self.key_path(fp_pk), serde_json::to_vec(&envelope)?)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<KeyEnvelope, EotsError> {
        let contents = std::fs::read(path)?;
        serde_json::from_slice(&contents).map_err(EotsError::from)
    }
}

impl KeyRing for FileKeyRing {
    fn create_key(
        &self,
        name: &str,
        passphrase: &str,
        _hd_path: &str,
    ) -> Result<FpPubKey, EotsError> {
        let mut rng = rand::thread_rng();
        let secret = SecretKey::new(&mut rng);
        let keypair = Keypair::from_secret_key(&self.secp, &secret);
        let (xonly, _parity) = keypair.x_only_public_key();
        let fp_pk = FpPubKey(xonly.serialize());

        let passphrase_hash = passphrase_key(name, passphrase);
        let (nonce, ciphertext) = Self::encrypt(&secret, &passphrase_hash);
        self.persist(&fp_pk, name, &nonce, &ciphertext)?;

        self.cache.lock().unwrap().insert(
            fp_pk,
            StoredKey {
                name: name.to_string(),
                passphrase_hash,
                secret,
            },
        );

        Ok(fp_pk)
    }

    fn secret_key(&self, fp_pk: &FpPubKey, passphrase: &str) -> Result<SecretKey, EotsError> {
        if let Some(stored) = self.cache.lock().unwrap().get(fp_pk) {
            let expected = passphrase_key(&stored.name, passphrase);
            if expected != stored.passphrase_hash {
                return Err(EotsError::BadPassphrase);
            }
            return Ok(stored.secret);
        }

        let path = self.key_path(fp_pk);
        if !path.exists() {
            return Err(EotsError::KeyNotFound(fp_pk.to_hex()));
        }
        let envelope = self.load(&path)?;
        let nonce =
            hex::decode(&envelope.nonce).map_err(|_| EotsError::KeyNotFound(fp_pk.to_hex()))?;
        let ciphertext = hex::decode(&envelope.ciphertext)
            .map_err(|_| EotsError::KeyNotFound(fp_pk.to_hex()))?;
        let passphrase_hash = passphrase_key(&envelope.name, passphrase);
        let secret = Self::decrypt(&nonce, &ciphertext, &passphrase_hash)?;

        self.cache.lock().unwrap().insert(
            *fp_pk,
            StoredKey {
                name: envelope.name,
                passphrase_hash,
                secret,
            },
        );

        Ok(secret)
    }
}

/// In-memory test double: no encryption, no filesystem.
#[derive(Default)]
pub struct MemoryKeyRing {
    keys: Mutex<HashMap<FpPubKey, SecretKey>>,
    secp: Option<Secp256k1<secp256k1::All>>,
}

impl MemoryKeyRing {
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            secp: Some(Secp256k1::new()),
        }
    }

    /// Test helper: insert a known secret key directly.
    pub fn insert(&self, secret: SecretKey) -> FpPubKey {
        let secp = self.secp.as_ref().unwrap();
        let keypair = Keypair::from_secret_key(secp, &secret);
        let (xonly, _) = keypair.x_only_public_key();
        let fp_pk = FpPubKey(xonly.serialize());
        self.keys.lock().unwrap().insert(fp_pk, secret);
        fp_pk
    }
}

impl KeyRing for MemoryKeyRing {
    fn create_key(
        &self,
        _name: &str,
        _passphrase: &str,
        _hd_path: &str,
    ) -> Result<FpPubKey, EotsError> {
        let mut rng = rand::thread_rng();
        let secret = SecretKey::new(&mut rng);
        Ok(self.insert(secret))
    }

    fn secret_key(&self, fp_pk: &FpPubKey, _passphrase: &str) -> Result<SecretKey, EotsError> {
        self.keys
            .lock()
            .unwrap()
            .get(fp_pk)
            .copied()
            .ok_or_else(|| EotsError::KeyNotFound(fp_pk.to_hex()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_keyring_roundtrips_secret() {
        let ring = MemoryKeyRing::new();
        let fp_pk = ring.create_key("fp1", "pw", "m/0").unwrap();
        assert!(ring.secret_key(&fp_pk, "pw").is_ok());
    }

    #[test]
    fn file_keyring_rejects_wrong_passphrase_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let ring = FileKeyRing::new(dir.path());
        let fp_pk = ring.create_key("fp1", "correct", "m/0").unwrap();
        assert!(ring.secret_key(&fp_pk, "correct").is_ok());
        assert!(matches!(
            ring.secret_key(&fp_pk, "wrong"),
            Err(EotsError::BadPassphrase)
        ));
    }

    #[test]
    fn file_keyring_decrypts_from_disk_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let fp_pk = {
            let ring = FileKeyRing::new(dir.path());
            ring.create_key("fp1", "correct", "m/0").unwrap()
        };

        // Fresh instance, empty in-memory cache: simulates a process restart.
        let ring = FileKeyRing::new(dir.path());
        assert!(ring.secret_key(&fp_pk, "correct").is_ok());

        let ring = FileKeyRing::new(dir.path());
        assert!(matches!(
            ring.secret_key(&fp_pk, "wrong"),
            Err(EotsError::BadPassphrase)
        ));
    }

    #[test]
    fn file_keyring_unknown_key_errors() {
        let dir = tempfile::tempdir().unwrap();
        let ring = FileKeyRing::new(dir.path());
        let bogus = FpPubKey([9u8; 32]);
        assert!(matches!(
            ring.secret_key(&bogus, "pw"),
            Err(EotsError::KeyNotFound(_))
        ));
    }
}
