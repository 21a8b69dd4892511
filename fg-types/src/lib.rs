//! Shared domain types for the finality-gadget operator: finality-provider
//! records, public-randomness commitments and proofs, votes, block info, and
//! the error/retry vocabulary the other crates build on.

pub mod block;
pub mod error;
pub mod fp;
pub mod merkle;
pub mod pubrand;
pub mod retry_config;
pub mod vote;

pub use block::{BlockHash, BlockInfo};
pub use error::{Classify, CriticalError, ErrorKind};
pub use fp::{FinalityProvider, FpPubKey, FpStatus};
pub use merkle::{MerkleProof, MerkleTree};
pub use pubrand::{PubRandCommit, PubRandProof};
pub use retry_config::RetryConfig;
pub use vote::{is_quorum, PowerMap, Vote};
