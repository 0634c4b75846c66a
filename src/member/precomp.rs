//! Member pre-computation: the four pairing values every signature reuses.

use crate::error::{EpidError, Result};
use crate::math::hash::HashAlg;
use crate::math::{pairing, params, G1Affine};
use crate::types::{GroupPubKey, MemberPrecomp};

/// Computes `e12 = e(h1, g2)`, `e22 = e(h2, g2)`, `e2w = e(h2, w)` and
/// `ea2 = e(A, g2)` for a key/credential pair. Deterministic, so exporting
/// the result twice yields identical bytes.
pub fn compute_member_precomp(pub_key: &GroupPubKey, a: &G1Affine) -> MemberPrecomp {
    let p = params();
    MemberPrecomp {
        e12: pairing(&pub_key.h1, &p.g2),
        e22: pairing(&pub_key.h2, &p.g2),
        e2w: pairing(&pub_key.h2, &pub_key.w),
        ea2: pairing(a, &p.g2),
    }
}

/// Accepts a caller-supplied precomp blob only if it equals the values the
/// member would compute itself.
pub(crate) fn validate_precomp(
    pub_key: &GroupPubKey,
    a: &G1Affine,
    supplied: &MemberPrecomp,
) -> Result<MemberPrecomp> {
    let computed = compute_member_precomp(pub_key, a);
    if *supplied != computed {
        return Err(EpidError::PrecompNotInGroup);
    }
    Ok(computed)
}

/// Cached precomp, tagged with the hash algorithm active when it was
/// produced so a hash-algorithm change invalidates it.
#[derive(Debug, Clone)]
pub(crate) struct PrecompCache {
    pub alg: HashAlg,
    pub value: MemberPrecomp,
}
