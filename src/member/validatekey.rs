//! Membership-equation validation.

use ark_ec::CurveGroup;

use crate::math::{pairing, params, Fp, G1Affine, G2Projective};
use crate::types::{GroupPubKey, PrivKey};

/// Checks the membership equation
/// `e(A, w · g2^x) = e(g1, g2) · e(h1, g2)^f`
/// for a candidate `(A, x)` against the group key and a member secret.
pub(crate) fn membership_holds(pub_key: &GroupPubKey, a: &G1Affine, x: &Fp, f: &Fp) -> bool {
    let p = params();
    let lhs_g2 = (G2Projective::from(pub_key.w) + p.g2 * *x).into_affine();
    let lhs = pairing(a, &lhs_g2);
    let rhs = p.e_g1_g2 + pairing(&pub_key.h1, &p.g2) * *f;
    lhs == rhs
}

/// Full private-key check: the gid must match the group byte-for-byte and
/// the membership equation must hold.
pub(crate) fn is_priv_key_in_group(pub_key: &GroupPubKey, priv_key: &PrivKey) -> bool {
    if pub_key.gid.0 != priv_key.gid.0 {
        return false;
    }
    membership_holds(pub_key, &priv_key.a, &priv_key.x, &priv_key.f)
}
