//! Test-support issuer and verifier.
//!
//! The member crate only implements the member side; these helpers stand in
//! for the external collaborators so the protocol can be exercised
//! end-to-end: an issuer that creates groups, answers join requests, and
//! issues credentials, and a verifier that re-runs the signature equations
//! with public data only.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::Field;

use epid_member::math::hash::{hash_to_fp, hash_to_g1};
use epid_member::math::{pairing, params, Fp, G1Projective, G2Projective};
use epid_member::transcript::{join_challenge, nr_challenge, sign_challenge};
use epid_member::{
    CompressedPrivKey, EpidSignature, GroupId, GroupPubKey, IssuerNonce, JoinRequest,
    MembershipCredential, PrivKey, SigRl, SigRlEntry, SigStatus,
};

/// Issuer-side state: the group secret `gamma` with `w = g2^gamma`.
pub struct TestIssuer {
    pub pub_key: GroupPubKey,
    gamma: Fp,
}

impl TestIssuer {
    pub fn new(gid: GroupId, rng: &mut impl rand::RngCore) -> Self {
        use ark_ff::UniformRand;
        let p = params();
        let gamma = Fp::rand(rng);
        Self {
            pub_key: GroupPubKey {
                gid,
                h1: (p.g1 * Fp::rand(rng)).into_affine(),
                h2: (p.g1 * Fp::rand(rng)).into_affine(),
                w: (G2Projective::from(p.g2) * gamma).into_affine(),
            },
            gamma,
        }
    }

    /// Issues a full private key for a member secret, choosing `x` at
    /// random: `A = (g1 · h1^f)^{1/(x+gamma)}`.
    pub fn issue(&self, f: Fp, rng: &mut impl rand::RngCore) -> PrivKey {
        use ark_ff::UniformRand;
        self.issue_with_x(f, Fp::rand(rng))
    }

    pub fn issue_with_x(&self, f: Fp, x: Fp) -> PrivKey {
        let p = params();
        let inv = (x + self.gamma).inverse().expect("x + gamma is nonzero");
        let a = ((self.pub_key.h1 * f + p.g1) * inv).into_affine();
        PrivKey {
            gid: self.pub_key.gid,
            a,
            x,
            f,
        }
    }

    /// Verifies a join request against the nonce and, on success, issues a
    /// membership credential for the committed `F`.
    pub fn process_join_request(
        &self,
        request_bytes: &[u8],
        ni: &IssuerNonce,
        rng: &mut impl rand::RngCore,
    ) -> Option<MembershipCredential> {
        use ark_ff::UniformRand;
        let request = JoinRequest::from_bytes(request_bytes).ok()?;
        let alg = self.pub_key.gid.hash_alg().ok()?;
        // R = h1^s · F^{-c}; the challenge must recompute.
        let r = (self.pub_key.h1 * request.s - request.f * request.c).into_affine();
        let c = join_challenge(&self.pub_key, &request.f, &r, ni, alg);
        if c != request.c {
            return None;
        }
        let p = params();
        let x = Fp::rand(rng);
        let inv = (x + self.gamma).inverse().expect("x + gamma is nonzero");
        // A = (g1 · F)^{1/(x+gamma)}
        let a = ((G1Projective::from(request.f) + p.g1) * inv).into_affine();
        Some(MembershipCredential {
            gid: self.pub_key.gid,
            a,
            x,
        })
    }

    /// Builds a compressed key whose secrets derive from `seed` with the
    /// member's KDF, together with the reference decompressed key.
    pub fn compressed_key_for_seed(&self, seed: [u8; 32]) -> (CompressedPrivKey, PrivKey) {
        let alg = self.pub_key.gid.hash_alg().expect("fixture gid is valid");
        let mut kdf_input = [0u8; 36];
        kdf_input[..32].copy_from_slice(&seed);
        kdf_input[32..].copy_from_slice(&0u32.to_be_bytes());
        let x = hash_to_fp(&kdf_input, alg);
        kdf_input[32..].copy_from_slice(&1u32.to_be_bytes());
        let f = hash_to_fp(&kdf_input, alg);
        let full = self.issue_with_x(f, x);
        let compressed = CompressedPrivKey {
            gid: self.pub_key.gid,
            ax: full.a.x,
            seed,
        };
        (compressed, full)
    }

    /// Builds a revocation-list entry as a member with secret `other_f`
    /// would appear under `basename`.
    pub fn rl_entry_for(&self, other_f: Fp, basename: &[u8]) -> SigRlEntry {
        let alg = self.pub_key.gid.hash_alg().expect("fixture gid is valid");
        let (b, _) = hash_to_g1(basename, alg).expect("hash-to-curve");
        SigRlEntry {
            b,
            k: (b * other_f).into_affine(),
        }
    }
}

/// Stock verifier: checks the basic-signature equations and every
/// non-revoked proof using only public data.
pub fn verify(
    pub_key: &GroupPubKey,
    sig_bytes: &[u8],
    msg: &[u8],
    basename: Option<&[u8]>,
    sig_rl: Option<&SigRl>,
) -> SigStatus {
    let alg = match pub_key.gid.hash_alg() {
        Ok(alg) => alg,
        Err(_) => return SigStatus::Invalid,
    };
    let sig = match EpidSignature::from_bytes(sig_bytes) {
        Ok(sig) => sig,
        Err(_) => return SigStatus::Invalid,
    };
    let s0 = &sig.sigma0;
    if s0.b.is_zero() || s0.k.is_zero() {
        return SigStatus::Invalid;
    }
    if let Some(basename) = basename {
        let (expected_b, _) = match hash_to_g1(basename, alg) {
            Ok(b) => b,
            Err(_) => return SigStatus::Invalid,
        };
        if s0.b != expected_b {
            return SigStatus::Invalid;
        }
    }

    let p = params();
    // R1 = B^sf · K^{-c}
    let r1 = (s0.b * s0.sf - s0.k * s0.c).into_affine();
    // R2 = e(T,g2)^{-sx} · e(h1,g2)^{sf} · e(h2,g2)^{sb} · e(h2,w)^{sa}
    //      · (e(g1,g2) / e(T,w))^{c}
    let r2 = pairing(&s0.t, &p.g2) * (-s0.sx)
        + pairing(&pub_key.h1, &p.g2) * s0.sf
        + pairing(&pub_key.h2, &p.g2) * s0.sb
        + pairing(&pub_key.h2, &pub_key.w) * s0.sa
        + (p.e_g1_g2 - pairing(&s0.t, &pub_key.w)) * s0.c;
    let c = sign_challenge(pub_key, &s0.b, &s0.k, &s0.t, &r1, &r2, msg, alg);
    if c != s0.c {
        return SigStatus::Invalid;
    }

    match sig_rl {
        Some(rl) => {
            if sig.rl_ver != rl.version || sig.proofs.len() != rl.entries.len() {
                return SigStatus::Invalid;
            }
            let mut status = SigStatus::Valid;
            for (proof, entry) in sig.proofs.iter().zip(rl.entries.iter()) {
                // R1 = K^smu · B^snu, R2 = K'^smu · B'^snu · T^{-c}
                let nr_r1 = (s0.k * proof.smu + s0.b * proof.snu).into_affine();
                let nr_r2 =
                    (entry.k * proof.smu + entry.b * proof.snu - proof.t * proof.c).into_affine();
                let c_i = nr_challenge(&s0.b, &s0.k, entry, &proof.t, &nr_r1, &nr_r2, msg, alg);
                if c_i != proof.c {
                    return SigStatus::Invalid;
                }
                if proof.t.is_zero() {
                    status = SigStatus::RevokedInSigRl;
                }
            }
            status
        }
        None => {
            if sig.proofs.is_empty() {
                SigStatus::Valid
            } else {
                SigStatus::Invalid
            }
        }
    }
}
