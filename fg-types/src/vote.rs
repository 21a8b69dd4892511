use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::BlockHash;
use crate::fp::FpPubKey;
use crate::merkle::MerkleProof;

/// A single finality vote, per spec.md §3. Two votes with the same
/// `(fp_pk, height)` but different `block_hash` form an equivocation; the
/// double-sign guard in `fg_eotsmanager` exists to make this unreachable in
/// normal operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub fp_pk: FpPubKey,
    pub height: u64,
    pub block_hash: BlockHash,
    #[serde(with = "hex::serde")]
    pub pub_rand: [u8; 32],
    pub merkle_proof: MerkleProof,
    #[serde(with = "hex::serde")]
    pub eots_sig: [u8; 32],
}

/// Per-BTC-height voting power, keyed by finality provider.
pub type PowerMap = BTreeMap<FpPubKey, u64>;

/// Decide Babylon-finalized status for a block given the voters and the full
/// power table, per spec.md §3 and the GLOSSARY's quorum definition.
pub fn is_quorum(voters: &[FpPubKey], powers: &PowerMap) -> bool {
    let total: u128 = powers.values().map(|&p| p as u128).sum();
    if total == 0 {
        return false;
    }
    let voted: u128 = voters
        .iter()
        .filter_map(|v| powers.get(v))
        .map(|&p| p as u128)
        .sum();
    voted * 3 >= total * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(b: u8) -> FpPubKey {
        FpPubKey([b; 32])
    }

    #[test]
    fn quorum_is_false_when_total_power_is_zero() {
        let powers = PowerMap::new();
        assert!(!is_quorum(&[pk(1)], &powers));
    }

    #[test]
    fn s5_finalization_quorum_is_met() {
        let mut powers = PowerMap::new();
        powers.insert(pk(1), 100);
        powers.insert(pk(2), 60);
        powers.insert(pk(3), 40);
        assert!(is_quorum(&[pk(1), pk(2)], &powers));
    }

    #[test]
    fn s6_finalization_near_miss() {
        let mut powers = PowerMap::new();
        powers.insert(pk(1), 100);
        powers.insert(pk(2), 60);
        powers.insert(pk(3), 40);
        assert!(!is_quorum(&[pk(1)], &powers));
    }
}
