//! EOTS keystore client (C1): key custody, deterministic public-randomness
//! derivation, EOTS/Schnorr signing, and the double-sign guard.

mod eots;
pub mod error;
pub mod guard;
pub mod keyring;
pub mod manager;
mod randomness;

pub use error::EotsError;
pub use guard::DoubleSignGuard;
pub use keyring::{FileKeyRing, KeyRing, MemoryKeyRing};
pub use manager::EotsManager;
pub use randomness::{create_randomness_pair_list, derive_secret_randomness, public_randomness};
