//! Hashing into the fields and into G1.
//!
//! The hash algorithm is not free-standing configuration: it is encoded in
//! the low nibble of byte 1 of the group id, and every transcript hash uses
//! the algorithm the gid selects.

use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::{BigInteger, Field, PrimeField};
use sha2::{Digest, Sha256, Sha384, Sha512, Sha512_256};

use crate::error::{EpidError, Result};
use crate::math::{Fp, Fq, G1Affine};

const LOG_TARGET: &str = "epid_member::math::hash";

/// Upper bound on the hash-to-G1 counter. Roughly half of all candidate x
/// coordinates land on the curve, so hitting this bound does not happen for
/// honest inputs.
const MAX_HASH_TO_G1_ITERS: u32 = 256;

/// Hash algorithms a group id may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    Sha256,
    Sha384,
    Sha512,
    Sha512_256,
}

impl HashAlg {
    /// Decodes the low nibble of byte 1 of a group id. Tags 4-15 are
    /// reserved.
    pub fn from_gid_nibble(nibble: u8) -> Result<Self> {
        match nibble {
            0 => Ok(Self::Sha256),
            1 => Ok(Self::Sha384),
            2 => Ok(Self::Sha512),
            3 => Ok(Self::Sha512_256),
            _ => Err(EpidError::HashAlgorithmNotSupported),
        }
    }

    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Sha512_256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    fn digest_parts(self, parts: &[&[u8]]) -> Vec<u8> {
        fn run<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
            let mut h = D::new();
            for p in parts {
                h.update(p);
            }
            h.finalize().to_vec()
        }
        match self {
            Self::Sha256 => run::<Sha256>(parts),
            Self::Sha384 => run::<Sha384>(parts),
            Self::Sha512 => run::<Sha512>(parts),
            Self::Sha512_256 => run::<Sha512_256>(parts),
        }
    }
}

/// Digest `bytes`, interpret the digest big-endian, reduce modulo `p`.
pub fn hash_to_fp(bytes: &[u8], alg: HashAlg) -> Fp {
    Fp::from_be_bytes_mod_order(&alg.digest_parts(&[bytes]))
}

fn hash_to_fq(parts: &[&[u8]], alg: HashAlg) -> Fq {
    Fq::from_be_bytes_mod_order(&alg.digest_parts(parts))
}

/// Hash arbitrary bytes to a point of G1.
///
/// Iterates a 32-bit big-endian counter prefix over the input until the
/// digest, reduced into Fq, is the x coordinate of a curve point; the y
/// coordinate is the lexicographically smaller square root. Returns the
/// point together with the counter value that produced it.
pub fn hash_to_g1(bytes: &[u8], alg: HashAlg) -> Result<(G1Affine, u32)> {
    for i in 0..MAX_HASH_TO_G1_ITERS {
        let x = hash_to_fq(&[&i.to_be_bytes(), bytes], alg);
        let y2 = x * x * x + ark_bn254::g1::Config::COEFF_B;
        if let Some(y) = y2.sqrt() {
            let y = min_root(y);
            let point = G1Affine::new_unchecked(x, y);
            // On-curve by construction; BN254 G1 has cofactor 1 so the
            // subgroup check cannot fail here.
            debug_assert!(point.is_on_curve());
            debug_assert!(point.is_in_correct_subgroup_assuming_on_curve());
            tracing::trace!(target: LOG_TARGET, counter = i, "hashed to curve point");
            return Ok((point, i));
        }
    }
    tracing::warn!(target: LOG_TARGET, "hash-to-G1 counter exhausted");
    Err(EpidError::Math)
}

/// The smaller of `y` and `-y` in canonical big-endian order.
fn min_root(y: Fq) -> Fq {
    let neg = -y;
    if neg.into_bigint() < y.into_bigint() {
        neg
    } else {
        y
    }
}
