//! Pre-computed signatures and their pool.
//!
//! A pre-computed signature is the output of the sign-commit equations with
//! a fresh random base and all commit scalars, minus the dependence on the
//! basename and the challenge. Holding a pool of them makes `sign_commit`
//! cheap relative to the curve operations.

use ark_ec::{AffineRepr, CurveGroup};
use zeroize::Zeroize;

use crate::custodian::CustodianKey;
use crate::error::{EpidError, Result};
use crate::math::rand::{random_fp_nonzero, BitSupplier};
use crate::math::{gt_multi_exp, params, Fp, G1Affine, Gt};
use ark_std::Zero;

/// Commit-phase scalars of one pre-computed signature. Wiped on drop.
#[derive(Debug, Clone)]
pub struct PresigScalars {
    pub a: Fp,
    /// `b = a * x mod p`
    pub b: Fp,
    pub rx: Fp,
    pub rf: Fp,
    pub ra: Fp,
    pub rb: Fp,
}

impl Zeroize for PresigScalars {
    fn zeroize(&mut self) {
        self.a.zeroize();
        self.b.zeroize();
        self.rx.zeroize();
        self.rf.zeroize();
        self.ra.zeroize();
        self.rb.zeroize();
    }
}

impl Drop for PresigScalars {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// One pre-computed partial signature. Never leaves the custodian boundary.
#[derive(Debug, Clone)]
pub struct PreComputedSignature {
    pub b: G1Affine,
    pub k: G1Affine,
    pub t: G1Affine,
    pub r1: G1Affine,
    pub r2: Gt,
    pub scalars: PresigScalars,
}

impl Drop for PreComputedSignature {
    fn drop(&mut self) {
        self.b = G1Affine::zero();
        self.k = G1Affine::zero();
        self.t = G1Affine::zero();
        self.r1 = G1Affine::zero();
        self.r2 = Gt::zero();
    }
}

/// Runs the pre-computation: `B` random, `K = B^f`, `T = h2^a · A`,
/// `R1 = B^rf`, `R2 = ea2^(-rx) · e12^rf · e22^(rb - a·rx) · e2w^ra`.
pub fn compute_presig(
    supplier: &mut dyn BitSupplier,
    max_iters: u32,
    key: &CustodianKey,
    f: &Fp,
) -> Result<PreComputedSignature> {
    let g1 = params().g1;

    let mut base_exp = random_fp_nonzero(supplier, max_iters)?;
    let b = (g1 * base_exp).into_affine();
    base_exp.zeroize();

    let k = (b * *f).into_affine();

    let a = random_fp_nonzero(supplier, max_iters)?;
    let t = (key.h2 * a + key.a).into_affine();
    let b_scalar = a * key.x;

    let rx = random_fp_nonzero(supplier, max_iters)?;
    let rb = random_fp_nonzero(supplier, max_iters)?;
    let rf = random_fp_nonzero(supplier, max_iters)?;
    let ra = random_fp_nonzero(supplier, max_iters)?;

    let r1 = (b * rf).into_affine();

    let mut t1 = -rx;
    let mut t2 = rb - a * rx;
    let r2 = gt_multi_exp(&[(key.ea2, t1), (key.e12, rf), (key.e22, t2), (key.e2w, ra)]);
    t1.zeroize();
    t2.zeroize();

    Ok(PreComputedSignature {
        b,
        k,
        t,
        r1,
        r2,
        scalars: PresigScalars {
            a,
            b: b_scalar,
            rx,
            rf,
            ra,
            rb,
        },
    })
}

/// Bounded stack of pre-computed signatures.
#[derive(Debug)]
pub struct PresigPool {
    items: Vec<PreComputedSignature>,
    max_entries: usize,
}

impl PresigPool {
    pub fn new(max_entries: usize) -> Self {
        Self {
            items: Vec::new(),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Pushes a batch. Nothing is added if the batch would exceed the cap,
    /// which also gives `add_presigs` its all-or-nothing behavior.
    pub fn push_many(&mut self, batch: Vec<PreComputedSignature>) -> Result<()> {
        if self.items.len() + batch.len() > self.max_entries {
            return Err(EpidError::MaxEntries);
        }
        self.items.extend(batch);
        Ok(())
    }

    pub fn top(&self) -> Option<&PreComputedSignature> {
        self.items.last()
    }

    pub fn pop(&mut self) -> Option<PreComputedSignature> {
        self.items.pop()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
