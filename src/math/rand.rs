//! Random-bit supply and uniform scalar sampling.
//!
//! The caller chooses the entropy source. Anything that can fill a byte
//! buffer works; [`RngSupplier`] adapts any [`rand::RngCore`].

use ark_ff::{BigInteger, PrimeField};
use ark_std::Zero;

use crate::error::{EpidError, Result};
use crate::math::Fp;

const LOG_TARGET: &str = "epid_member::math::rand";

/// Default bound on rejection-sampling retries.
pub const DEFAULT_MAX_RAND_ITERS: u32 = 16;

/// Source of random bits. Implementations report exhaustion or failure
/// through the error return; the member maps it to
/// [`EpidError::BitSupplier`].
pub trait BitSupplier {
    fn fill_bytes(&mut self, out: &mut [u8]) -> std::result::Result<(), BitSupplierFailure>;
}

/// Opaque supplier failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSupplierFailure;

/// Adapter over any `rand` generator.
pub struct RngSupplier<R: rand::RngCore>(pub R);

impl<R: rand::RngCore> BitSupplier for RngSupplier<R> {
    fn fill_bytes(&mut self, out: &mut [u8]) -> std::result::Result<(), BitSupplierFailure> {
        self.0.try_fill_bytes(out).map_err(|_| BitSupplierFailure)
    }
}

/// Draws a scalar uniformly from `[1, p-1]` by bounded rejection sampling.
///
/// Each attempt draws 32 bytes, interprets them big-endian, and accepts only
/// canonical non-zero values (raw value in `[1, p-1]`). After `max_iters`
/// rejected draws the operation fails with [`EpidError::RandMaxIter`]; a
/// supplier error fails with [`EpidError::BitSupplier`].
pub fn random_fp_nonzero(supplier: &mut dyn BitSupplier, max_iters: u32) -> Result<Fp> {
    let mut buf = [0u8; 32];
    for _ in 0..max_iters {
        supplier
            .fill_bytes(&mut buf)
            .map_err(|_| EpidError::BitSupplier)?;
        let candidate = Fp::from_be_bytes_mod_order(&buf);
        if candidate.is_zero() {
            continue;
        }
        // A draw at or above the modulus wraps, so its canonical encoding no
        // longer matches the raw bytes; reject it to stay uniform.
        if candidate.into_bigint().to_bytes_be() != buf {
            continue;
        }
        buf.iter_mut().for_each(|b| *b = 0);
        return Ok(candidate);
    }
    buf.iter_mut().for_each(|b| *b = 0);
    tracing::warn!(target: LOG_TARGET, max_iters, "rejection sampling exhausted");
    Err(EpidError::RandMaxIter)
}
