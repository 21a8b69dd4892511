use serde::{Deserialize, Serialize};

use crate::fp::FpPubKey;
use crate::merkle::MerkleProof;

/// A committed, contiguous window of public randomness, per spec.md §3.
///
/// Windows for a single `fp_pk` must be non-overlapping; callers enforce this
/// before persisting (see `fg_operator`'s commitment loop).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubRandCommit {
    pub fp_pk: FpPubKey,
    pub start_height: u64,
    pub num_pub_rand: u64,
    #[serde(with = "hex::serde")]
    pub commitment: [u8; 32],
    #[serde(with = "hex::serde")]
    pub signature: [u8; 64],
}

impl PubRandCommit {
    pub fn end_height(&self) -> u64 {
        self.start_height + self.num_pub_rand
    }

    pub fn covers(&self, height: u64) -> bool {
        height >= self.start_height && height < self.end_height()
    }
}

/// A Merkle-opening for one committed leaf, stored per `(fp_pk, height)` (C2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubRandProof {
    pub fp_pk: FpPubKey,
    pub height: u64,
    #[serde(with = "hex::serde")]
    pub pub_rand: [u8; 32],
    pub proof: MerkleProof,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(start: u64, num: u64) -> PubRandCommit {
        PubRandCommit {
            fp_pk: FpPubKey([1u8; 32]),
            start_height: start,
            num_pub_rand: num,
            commitment: [0u8; 32],
            signature: [0u8; 64],
        }
    }

    #[test]
    fn covers_checks_half_open_interval() {
        let c = commit(100, 10);
        assert!(!c.covers(99));
        assert!(c.covers(100));
        assert!(c.covers(109));
        assert!(!c.covers(110));
        assert_eq!(c.end_height(), 110);
    }
}
