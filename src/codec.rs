//! Fixed-width big-endian serialization of field and group elements.
//!
//! Every element has exactly one encoding: scalars and base-field elements
//! are 32-byte canonical big-endian integers, points are their affine
//! coordinate pairs, and the all-zero string encodes the G1/G2 identity.
//! Reads reject non-canonical integers and off-curve or out-of-subgroup
//! points with [`EpidError::BadArg`]; callers attach the argument-specific
//! category.

use ark_bn254::{Fq12, Fq6};
use ark_ec::pairing::PairingOutput;
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};

use crate::error::{EpidError, Result};
use crate::math::{Fp, Fq, Fq2, G1Affine, G2Affine, Gt};

pub const FP_SIZE: usize = 32;
pub const FQ_SIZE: usize = 32;
pub const G1_SIZE: usize = 2 * FQ_SIZE;
pub const G2_SIZE: usize = 4 * FQ_SIZE;
pub const GT_SIZE: usize = 12 * FQ_SIZE;

pub fn fp_to_bytes(v: &Fp) -> [u8; FP_SIZE] {
    let mut out = [0u8; FP_SIZE];
    out.copy_from_slice(&v.into_bigint().to_bytes_be());
    out
}

pub fn read_fp(bytes: &[u8]) -> Result<Fp> {
    if bytes.len() != FP_SIZE {
        return Err(EpidError::BadArg);
    }
    let v = Fp::from_be_bytes_mod_order(bytes);
    if v.into_bigint().to_bytes_be() != bytes {
        return Err(EpidError::BadArg);
    }
    Ok(v)
}

pub fn fq_to_bytes(v: &Fq) -> [u8; FQ_SIZE] {
    let mut out = [0u8; FQ_SIZE];
    out.copy_from_slice(&v.into_bigint().to_bytes_be());
    out
}

pub fn read_fq(bytes: &[u8]) -> Result<Fq> {
    if bytes.len() != FQ_SIZE {
        return Err(EpidError::BadArg);
    }
    let v = Fq::from_be_bytes_mod_order(bytes);
    if v.into_bigint().to_bytes_be() != bytes {
        return Err(EpidError::BadArg);
    }
    Ok(v)
}

pub fn g1_to_bytes(p: &G1Affine) -> [u8; G1_SIZE] {
    let mut out = [0u8; G1_SIZE];
    if p.is_zero() {
        return out;
    }
    out[..FQ_SIZE].copy_from_slice(&fq_to_bytes(&p.x));
    out[FQ_SIZE..].copy_from_slice(&fq_to_bytes(&p.y));
    out
}

/// Reads a G1 point. The all-zero string decodes to the identity; callers
/// that require a non-identity point check for it.
pub fn read_g1(bytes: &[u8]) -> Result<G1Affine> {
    if bytes.len() != G1_SIZE {
        return Err(EpidError::BadArg);
    }
    if bytes.iter().all(|b| *b == 0) {
        return Ok(G1Affine::zero());
    }
    let x = read_fq(&bytes[..FQ_SIZE])?;
    let y = read_fq(&bytes[FQ_SIZE..])?;
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(EpidError::BadArg);
    }
    Ok(point)
}

fn fq2_to_bytes(v: &Fq2, out: &mut [u8]) {
    out[..FQ_SIZE].copy_from_slice(&fq_to_bytes(&v.c0));
    out[FQ_SIZE..].copy_from_slice(&fq_to_bytes(&v.c1));
}

fn read_fq2(bytes: &[u8]) -> Result<Fq2> {
    let c0 = read_fq(&bytes[..FQ_SIZE])?;
    let c1 = read_fq(&bytes[FQ_SIZE..])?;
    Ok(Fq2::new(c0, c1))
}

pub fn g2_to_bytes(p: &G2Affine) -> [u8; G2_SIZE] {
    let mut out = [0u8; G2_SIZE];
    if p.is_zero() {
        return out;
    }
    fq2_to_bytes(&p.x, &mut out[..2 * FQ_SIZE]);
    fq2_to_bytes(&p.y, &mut out[2 * FQ_SIZE..]);
    out
}

pub fn read_g2(bytes: &[u8]) -> Result<G2Affine> {
    if bytes.len() != G2_SIZE {
        return Err(EpidError::BadArg);
    }
    if bytes.iter().all(|b| *b == 0) {
        return Ok(G2Affine::zero());
    }
    let x = read_fq2(&bytes[..2 * FQ_SIZE])?;
    let y = read_fq2(&bytes[2 * FQ_SIZE..])?;
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(EpidError::BadArg);
    }
    Ok(point)
}

/// GT elements serialize as their twelve Fq coefficients in tower order,
/// `c0.c0.c0` first.
pub fn gt_to_bytes(v: &Gt) -> [u8; GT_SIZE] {
    let mut out = [0u8; GT_SIZE];
    let coeffs = [
        v.0.c0.c0.c0,
        v.0.c0.c0.c1,
        v.0.c0.c1.c0,
        v.0.c0.c1.c1,
        v.0.c0.c2.c0,
        v.0.c0.c2.c1,
        v.0.c1.c0.c0,
        v.0.c1.c0.c1,
        v.0.c1.c1.c0,
        v.0.c1.c1.c1,
        v.0.c1.c2.c0,
        v.0.c1.c2.c1,
    ];
    for (i, c) in coeffs.iter().enumerate() {
        out[i * FQ_SIZE..(i + 1) * FQ_SIZE].copy_from_slice(&fq_to_bytes(c));
    }
    out
}

pub fn read_gt(bytes: &[u8]) -> Result<Gt> {
    if bytes.len() != GT_SIZE {
        return Err(EpidError::BadArg);
    }
    let mut coeffs = [Fq::from(0u64); 12];
    for (i, c) in coeffs.iter_mut().enumerate() {
        *c = read_fq(&bytes[i * FQ_SIZE..(i + 1) * FQ_SIZE])?;
    }
    let c0 = Fq6::new(
        Fq2::new(coeffs[0], coeffs[1]),
        Fq2::new(coeffs[2], coeffs[3]),
        Fq2::new(coeffs[4], coeffs[5]),
    );
    let c1 = Fq6::new(
        Fq2::new(coeffs[6], coeffs[7]),
        Fq2::new(coeffs[8], coeffs[9]),
        Fq2::new(coeffs[10], coeffs[11]),
    );
    Ok(PairingOutput(Fq12::new(c0, c1)))
}

pub fn write_u32(v: u32, out: &mut [u8]) {
    out[..4].copy_from_slice(&v.to_be_bytes());
}

pub fn read_u32(bytes: &[u8]) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(b)
}
