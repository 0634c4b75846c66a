//! Pairing-group plumbing shared by every protocol module.
//!
//! The scheme lives on the type-3 Barreto–Naehrig curve exposed by
//! `ark-bn254`. `Fp` is the scalar field of G1 (the order of all three
//! groups), `Fq` the base field. All protocol exponents are `Fp` elements.

pub mod hash;
pub mod rand;

use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use ark_std::Zero;
use once_cell::sync::Lazy;

pub use ark_bn254::{Fq, Fq2, Fr as Fp, G1Affine, G1Projective, G2Affine, G2Projective};

/// The pairing target group, written multiplicatively in the protocol but
/// additively by arkworks.
pub type Gt = PairingOutput<ark_bn254::Bn254>;

/// Fixed group parameters every transcript and pairing computation refers to.
pub struct Epid2Params {
    /// Big-endian serialization of the group order `p`.
    pub p_str: [u8; 32],
    pub g1: G1Affine,
    pub g2: G2Affine,
    /// `e(g1, g2)`, the right-hand anchor of the membership equation.
    pub e_g1_g2: Gt,
}

static PARAMS: Lazy<Epid2Params> = Lazy::new(|| {
    let g1 = G1Affine::generator();
    let g2 = G2Affine::generator();
    let p_bytes = Fp::MODULUS.to_bytes_be();
    let mut p_str = [0u8; 32];
    p_str.copy_from_slice(&p_bytes);
    Epid2Params {
        p_str,
        g1,
        g2,
        e_g1_g2: pairing(&g1, &g2),
    }
});

pub fn params() -> &'static Epid2Params {
    &PARAMS
}

pub fn pairing(a: &G1Affine, b: &G2Affine) -> Gt {
    ark_bn254::Bn254::pairing(*a, *b)
}

/// Product of `base_i ^ exp_i` over GT (sum in additive notation).
pub fn gt_multi_exp(terms: &[(Gt, Fp)]) -> Gt {
    terms
        .iter()
        .fold(Gt::zero(), |acc, (base, exp)| acc + *base * *exp)
}
