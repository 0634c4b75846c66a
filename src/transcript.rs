//! Fiat-Shamir challenge transcripts.
//!
//! Each protocol hashes a fixed-width concatenation of public values into
//! `Fp`. Field widths are exactly the wire widths from [`crate::codec`];
//! there are no length prefixes or separators, so the layouts below are
//! byte-compatible with external verifiers.

use crate::codec::{g1_to_bytes, g2_to_bytes, gt_to_bytes};
use crate::math::hash::{hash_to_fp, HashAlg};
use crate::math::{params, Fp, G1Affine, G2Affine, Gt};
use crate::types::{GroupPubKey, IssuerNonce, SigRlEntry};

/// Canonical commit-transcript accumulator.
struct Transcript {
    buf: Vec<u8>,
}

impl Transcript {
    fn new(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity + 32);
        buf.extend_from_slice(&params().p_str);
        Self { buf }
    }

    fn append_g1(&mut self, p: &G1Affine) -> &mut Self {
        self.buf.extend_from_slice(&g1_to_bytes(p));
        self
    }

    fn append_g2(&mut self, p: &G2Affine) -> &mut Self {
        self.buf.extend_from_slice(&g2_to_bytes(p));
        self
    }

    fn append_gt(&mut self, v: &Gt) -> &mut Self {
        self.buf.extend_from_slice(&gt_to_bytes(v));
        self
    }

    fn append_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    fn challenge(&self, alg: HashAlg) -> Fp {
        hash_to_fp(&self.buf, alg)
    }
}

/// Join commitment hash:
/// `c = HashToFp(p ‖ g1 ‖ g2 ‖ h1 ‖ h2 ‖ w ‖ F ‖ R ‖ ni)`.
pub fn join_challenge(
    pub_key: &GroupPubKey,
    f: &G1Affine,
    r: &G1Affine,
    ni: &IssuerNonce,
    alg: HashAlg,
) -> Fp {
    let p = params();
    let mut t = Transcript::new(640);
    t.append_g1(&p.g1)
        .append_g2(&p.g2)
        .append_g1(&pub_key.h1)
        .append_g1(&pub_key.h2)
        .append_g2(&pub_key.w)
        .append_g1(f)
        .append_g1(r)
        .append_bytes(&ni.0);
    t.challenge(alg)
}

/// Sign commitment hash:
/// `c = HashToFp(p ‖ g1 ‖ g2 ‖ h1 ‖ h2 ‖ w ‖ B ‖ K ‖ T ‖ R1 ‖ R2 ‖ msg)`.
#[allow(clippy::too_many_arguments)]
pub fn sign_challenge(
    pub_key: &GroupPubKey,
    b: &G1Affine,
    k: &G1Affine,
    t_pt: &G1Affine,
    r1: &G1Affine,
    r2: &Gt,
    msg: &[u8],
    alg: HashAlg,
) -> Fp {
    let p = params();
    let mut t = Transcript::new(1056 + msg.len());
    t.append_g1(&p.g1)
        .append_g2(&p.g2)
        .append_g1(&pub_key.h1)
        .append_g1(&pub_key.h2)
        .append_g2(&pub_key.w)
        .append_g1(b)
        .append_g1(k)
        .append_g1(t_pt)
        .append_g1(r1)
        .append_gt(r2)
        .append_bytes(msg);
    t.challenge(alg)
}

/// Non-revoked-proof commitment hash:
/// `c = HashToFp(p ‖ g1 ‖ B ‖ K ‖ B_i ‖ K_i ‖ T ‖ R1 ‖ R2 ‖ msg)`.
#[allow(clippy::too_many_arguments)]
pub fn nr_challenge(
    b: &G1Affine,
    k: &G1Affine,
    entry: &SigRlEntry,
    t_pt: &G1Affine,
    r1: &G1Affine,
    r2: &G1Affine,
    msg: &[u8],
    alg: HashAlg,
) -> Fp {
    let p = params();
    let mut t = Transcript::new(608 + msg.len());
    t.append_g1(&p.g1)
        .append_g1(b)
        .append_g1(k)
        .append_g1(&entry.b)
        .append_g1(&entry.k)
        .append_g1(t_pt)
        .append_g1(r1)
        .append_g1(r2)
        .append_bytes(msg);
    t.challenge(alg)
}
