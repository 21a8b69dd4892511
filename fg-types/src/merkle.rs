//! Merkle tree over public-randomness leaves, and the per-leaf opening proofs
//! required to submit a finality signature (spec.md §3, §6).

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

fn leaf_hash(leaf: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update([0x00]);
    hasher.update(leaf);
    hasher.finalize().into()
}

fn inner_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update([0x01]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// A Merkle-opening for a single leaf, per the `proof` field of
/// `submit_finality_signature` (spec.md §6).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub total: i64,
    pub index: i64,
    pub leaf_hash: Vec<u8>,
    pub aunts: Vec<Vec<u8>>,
}

impl MerkleProof {
    /// Recompute the root implied by this opening and compare against `root`.
    pub fn verify(&self, root: &[u8; 32]) -> bool {
        let mut hash: [u8; 32] = match self.leaf_hash.as_slice().try_into() {
            Ok(h) => h,
            Err(_) => return false,
        };
        let mut index = self.index;

        for aunt in &self.aunts {
            let aunt: [u8; 32] = match aunt.as_slice().try_into() {
                Ok(h) => h,
                Err(_) => return false,
            };
            hash = if index % 2 == 0 {
                inner_hash(&hash, &aunt)
            } else {
                inner_hash(&aunt, &hash)
            };
            index /= 2;
        }

        &hash == root
    }
}

/// Builds a Merkle tree over a contiguous run of public-randomness leaves and
/// produces the root plus a per-index opening, following the RFC 6962-style
/// binary tree used by Tendermint-family chains (leaf/inner domain
/// separation, odd-node promotion).
pub struct MerkleTree {
    leaves: Vec<[u8; 32]>,
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    pub fn new(leaves: &[[u8; 32]]) -> Self {
        let hashed_leaves: Vec<[u8; 32]> = leaves.iter().map(|l| leaf_hash(l)).collect();
        let mut levels = vec![hashed_leaves.clone()];
        let mut current = hashed_leaves;
        while current.len() > 1 {
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            let mut i = 0;
            while i < current.len() {
                if i + 1 < current.len() {
                    next.push(inner_hash(&current[i], &current[i + 1]));
                } else {
                    next.push(current[i]);
                }
                i += 2;
            }
            levels.push(next.clone());
            current = next;
        }
        Self {
            leaves: leaves.to_vec(),
            levels,
        }
    }

    pub fn root(&self) -> [u8; 32] {
        self.levels
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    /// Build the opening proof for leaf `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }
        let total = self.leaves.len() as i64;
        let mut aunts = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let sibling = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            if sibling < level.len() {
                aunts.push(level[sibling].to_vec());
            }
            idx /= 2;
        }
        Some(MerkleProof {
            total,
            index: index as i64,
            leaf_hash: leaf_hash(&self.leaves[index]).to_vec(),
            aunts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<[u8; 32]> {
        (0..n)
            .map(|i| {
                let mut l = [0u8; 32];
                l[0] = i as u8;
                l
            })
            .collect()
    }

    #[test]
    fn single_leaf_root_is_its_leaf_hash() {
        let ls = leaves(1);
        let tree = MerkleTree::new(&ls);
        assert_eq!(tree.root(), leaf_hash(&ls[0]));
    }

    #[test]
    fn proof_out_of_range_is_none() {
        let tree = MerkleTree::new(&leaves(4));
        assert!(tree.proof(4).is_none());
    }

    #[test]
    fn every_leaf_produces_a_proof() {
        let n = 7;
        let tree = MerkleTree::new(&leaves(n));
        for i in 0..n {
            assert!(tree.proof(i).is_some());
        }
    }

    #[test]
    fn proof_verifies_against_root_for_balanced_tree() {
        let n = 8;
        let tree = MerkleTree::new(&leaves(n));
        let root = tree.root();
        for i in 0..n {
            let proof = tree.proof(i).unwrap();
            assert!(proof.verify(&root), "leaf {i} failed to verify");
        }
    }

    #[test]
    fn tampered_proof_fails_verification() {
        let tree = MerkleTree::new(&leaves(8));
        let root = tree.root();
        let mut proof = tree.proof(3).unwrap();
        proof.leaf_hash[0] ^= 0xff;
        assert!(!proof.verify(&root));
    }
}
