use serde::{Deserialize, Serialize};

/// A BIP-340 X-only public key identifying a finality provider.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FpPubKey(#[serde(with = "hex::serde")] pub [u8; 32]);

impl FpPubKey {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut buf = [0u8; 32];
        hex::decode_to_slice(s, &mut buf)?;
        Ok(Self(buf))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for FpPubKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FpPubKey({})", self.to_hex())
    }
}

impl std::fmt::Display for FpPubKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Lifecycle status of a finality provider, per spec.md §4.1.4.
///
/// A SLASHED provider never leaves SLASHED. JAILED only returns to ACTIVE
/// via an on-chain unjail observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FpStatus {
    Registered,
    Active,
    Inactive,
    Jailed,
    Slashed,
}

impl FpStatus {
    /// Whether the instance's loops should keep running in this state.
    pub fn is_runnable(&self) -> bool {
        !matches!(self, Self::Slashed)
    }

    /// Derive the next status from chain-reported power/jail/slash flags,
    /// per the transition table in spec.md §4.1.4.
    pub fn next(self, voting_power: u64, is_jailed: bool, is_slashed: bool) -> Self {
        if is_slashed || self == Self::Slashed {
            return Self::Slashed;
        }
        if is_jailed {
            return Self::Jailed;
        }
        if self == Self::Jailed {
            // JAILED -> ACTIVE only if chain power returns > 0; otherwise stay jailed.
            return if voting_power > 0 {
                Self::Active
            } else {
                Self::Jailed
            };
        }
        if voting_power > 0 {
            Self::Active
        } else if self == Self::Active {
            Self::Inactive
        } else {
            self
        }
    }
}

/// Persisted per-FP metadata record (C3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinalityProvider {
    pub fp_pk: FpPubKey,
    pub chain_id: String,
    pub address: String,
    pub description: Option<String>,
    pub commission_rate_bps: u32,
    pub status: FpStatus,
    pub last_voted_height: u64,
    pub last_commit_end_height: u64,
}

impl FinalityProvider {
    pub fn new(fp_pk: FpPubKey, chain_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            fp_pk,
            chain_id: chain_id.into(),
            address: address.into(),
            description: None,
            commission_rate_bps: 0,
            status: FpStatus::Registered,
            last_voted_height: 0,
            last_commit_end_height: 0,
        }
    }

    /// The height after which no randomness has been committed; 0 if no window exists yet.
    pub fn last_commit_end_height(&self) -> u64 {
        self.last_commit_end_height
    }

    /// Monotonicity guard: refuse to lower `last_voted_height`.
    pub fn advance_voted_height(&mut self, height: u64) {
        if height > self.last_voted_height {
            self.last_voted_height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fp_pubkey_hex_roundtrip() {
        let hex = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f8179";
        let pk = FpPubKey::from_hex(hex).unwrap();
        assert_eq!(pk.to_hex(), hex);
    }

    #[test]
    fn status_slashed_is_sticky() {
        let s = FpStatus::Slashed;
        assert_eq!(s.next(1_000, false, false), FpStatus::Slashed);
        assert_eq!(s.next(0, true, false), FpStatus::Slashed);
    }

    #[test]
    fn status_jailed_needs_power_to_reactivate() {
        let s = FpStatus::Jailed;
        assert_eq!(s.next(0, false, false), FpStatus::Jailed);
        assert_eq!(s.next(50, false, false), FpStatus::Active);
    }

    #[test]
    fn status_active_drops_to_inactive_without_power() {
        let s = FpStatus::Active;
        assert_eq!(s.next(0, false, false), FpStatus::Inactive);
        assert_eq!(s.next(10, false, false), FpStatus::Active);
    }

    #[test]
    fn advance_voted_height_never_decreases() {
        let mut fp = FinalityProvider::new(FpPubKey([1u8; 32]), "chain-1", "bbn1abc");
        fp.advance_voted_height(10);
        fp.advance_voted_height(5);
        assert_eq!(fp.last_voted_height, 10);
        fp.advance_voted_height(20);
        assert_eq!(fp.last_voted_height, 20);
    }
}
