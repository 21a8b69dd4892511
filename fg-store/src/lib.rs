//! `redb`-backed persistence for finality-provider records (C3) and
//! public-randomness Merkle proofs (C2), following the teacher's
//! sync-`Db`/async-wrapper split so blocking I/O never runs on an async
//! executor thread.

pub mod error;
pub mod fp_store;
pub mod metrics;
pub mod pubrand_store;

pub use error::StoreError;
pub use fp_store::FpStore;
pub use metrics::DbMetrics;
pub use pubrand_store::PubRandStore;
