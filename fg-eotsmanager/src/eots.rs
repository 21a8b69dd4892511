//! The EOTS scalar signature: `s = r + e * sk (mod n)`, where `e` is the
//! Fiat-Shamir challenge over the public randomness, the signer's key, and
//! the message. Signing two distinct messages under the same `r` leaks `sk`
//! via `sk = (s1 - s2) / (e1 - e2) (mod n)` — the property the double-sign
//! guard in `manager.rs` exists to make unreachable.

use fg_types::FpPubKey;
use secp256k1::{Scalar, SecretKey};

use crate::randomness::eots_challenge;

/// `sign_eots`'s inner scalar arithmetic, unguarded. Exposed separately so
/// `manager.rs` can wrap it with the double-sign check without duplicating
/// the math, and so `unsafe_sign_eots` can call it directly per spec.md §4.2.
pub fn eots_sign_scalar(
    fp_priv: &SecretKey,
    fp_pk: &FpPubKey,
    secret_randomness: &SecretKey,
    pub_rand: &[u8; 32],
    chain_id: &str,
    height: u64,
    msg: &[u8],
) -> [u8; 32] {
    let e = eots_challenge(pub_rand, fp_pk, chain_id, height, msg);
    let e_sk = fp_priv
        .mul_tweak(&Scalar::from(e))
        .expect("scalar multiplication mod n cannot fail for nonzero e");
    let s = secret_randomness
        .add_tweak(&Scalar::from(e_sk))
        .expect("scalar addition mod n cannot fail");
    s.secret_bytes()
}

/// Recover `sk` from two EOTS signatures over distinct messages produced
/// under the same public randomness. Used only by tests to demonstrate the
/// extractability property the double-sign guard protects against.
#[cfg(test)]
pub fn extract_secret_key(
    fp_pk: &FpPubKey,
    pub_rand: &[u8; 32],
    chain_id: &str,
    height: u64,
    msg_a: &[u8],
    sig_a: &[u8; 32],
    msg_b: &[u8],
    sig_b: &[u8; 32],
) -> SecretKey {
    use secp256k1::SECP256K1;

    let e_a = eots_challenge(pub_rand, fp_pk, chain_id, height, msg_a);
    let e_b = eots_challenge(pub_rand, fp_pk, chain_id, height, msg_b);

    let s_a = SecretKey::from_slice(sig_a).unwrap();
    let s_b = SecretKey::from_slice(sig_b).unwrap();

    // sk = (s_a - s_b) * (e_a - e_b)^-1 (mod n)
    let neg_s_b = s_b.negate();
    let numerator = s_a
        .add_tweak(&Scalar::from(neg_s_b))
        .expect("s_a - s_b is nonzero whenever msg_a != msg_b");

    let neg_e_b = e_b.negate();
    let denom = e_a
        .add_tweak(&Scalar::from(neg_e_b))
        .expect("e_a - e_b is nonzero whenever msg_a != msg_b");

    let inv_denom = invert_scalar(&denom);
    let sk = numerator
        .mul_tweak(&Scalar::from(inv_denom))
        .expect("scalar multiplication mod n cannot fail");

    let _ = SECP256K1;
    sk
}

#[cfg(test)]
fn invert_scalar(s: &SecretKey) -> SecretKey {
    // Fermat's little theorem: s^(n-2) mod n == s^-1 mod n, via
    // square-and-multiply. Only used in tests, where n - 2 is a fixed
    // constant of the secp256k1 group order.
    const ORDER_MINUS_2: [u8; 32] = [
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xBA, 0xAE,
        0xDC, 0xE5,
    ];
    let one_bytes: [u8; 32] = {
        let mut b = [0u8; 32];
        b[31] = 1;
        b
    };
    let mut result = SecretKey::from_slice(&one_bytes).unwrap();
    for byte in ORDER_MINUS_2 {
        for bit_idx in (0..8).rev() {
            result = result.mul_tweak(&Scalar::from(result)).unwrap();
            if (byte >> bit_idx) & 1 == 1 {
                result = result.mul_tweak(&Scalar::from(*s)).unwrap();
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::{derive_secret_randomness, public_randomness};

    #[test]
    fn double_sign_under_same_randomness_leaks_the_key() {
        let fp_priv = SecretKey::from_slice(&[11u8; 32]).unwrap();
        let secp = secp256k1::Secp256k1::new();
        let keypair = secp256k1::Keypair::from_secret_key(&secp, &fp_priv);
        let (xonly, _) = keypair.x_only_public_key();
        let fp_pk = FpPubKey(xonly.serialize());

        let r = derive_secret_randomness(&fp_priv, "chain-1", 42);
        let pub_rand = public_randomness(&r);

        let msg_a = b"block-hash-A";
        let msg_b = b"block-hash-B";

        let sig_a = eots_sign_scalar(&fp_priv, &fp_pk, &r, &pub_rand, "chain-1", 42, msg_a);
        let sig_b = eots_sign_scalar(&fp_priv, &fp_pk, &r, &pub_rand, "chain-1", 42, msg_b);

        let recovered = extract_secret_key(
            &fp_pk, &pub_rand, "chain-1", 42, msg_a, &sig_a, msg_b, &sig_b,
        );

        assert_eq!(recovered, fp_priv);
    }
}
