use serde::{Deserialize, Serialize};

/// A 32-byte block hash, the L2's unique identifier for a block at a height.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash(#[serde(with = "hex::serde")] pub [u8; 32]);

impl BlockHash {
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut buf = [0u8; 32];
        hex::decode_to_slice(s, &mut buf)?;
        Ok(Self(buf))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_hex_0x(&self) -> String {
        format!("0x{}", self.to_hex())
    }
}

impl std::fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockHash({})", self.to_hex_0x())
    }
}

/// `{height, hash, finalized}` as produced by the chain poller (C4), per spec.md §3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub hash: BlockHash,
    pub finalized: bool,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_hash_strips_0x_prefix_on_parse() {
        let hex = "00112233445566778899aabbccddeeff00112233445566778899aabbccddee";
        let a = BlockHash::from_hex(hex).unwrap();
        let b = BlockHash::from_hex(&format!("0x{hex}")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex_0x(), format!("0x{hex}"));
    }
}
