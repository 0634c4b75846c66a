//! Signature production: basic signature plus non-revoked proofs.

use ark_ec::AffineRepr;

use crate::error::{EpidError, Result, SigStatus};
use crate::math::hash::hash_to_g1;
use crate::transcript::{nr_challenge, sign_challenge};
use crate::types::{BasicSignature, EpidSignature, NrProof};

use super::MemberContext;

const LOG_TARGET: &str = "epid_member::member::sign";

impl MemberContext<'_> {
    /// Size in bytes of the next signature, given the revocation list in
    /// effect. The caller's output buffer must match it exactly.
    pub fn signature_size(&self) -> usize {
        EpidSignature::size_for(self.sig_rl.map_or(0, |rl| rl.entries.len()))
    }

    /// Signs `msg`, optionally under a registered basename, writing the
    /// signature into `out`.
    ///
    /// Returns [`SigStatus::Valid`] normally. When the member's own `(B, K)`
    /// pair matches a revocation-list entry the signature is still emitted
    /// fully formed, and the outcome is [`SigStatus::RevokedInSigRl`].
    pub fn sign(
        &mut self,
        msg: &[u8],
        basename: Option<&[u8]>,
        out: &mut [u8],
    ) -> Result<SigStatus> {
        if !self.is_provisioned() {
            return Err(EpidError::OutOfSequence);
        }
        let expected = self.signature_size();
        if out.len() < expected {
            return Err(EpidError::NoMem);
        }
        if out.len() > expected {
            return Err(EpidError::BadSignature);
        }

        self.ensure_precomp()?;
        let pub_key = self.pub_key.clone().ok_or(EpidError::OutOfSequence)?;
        let alg = self.hash_alg.ok_or(EpidError::OutOfSequence)?;
        let sig_rl = self.sig_rl;

        let b_in = match basename {
            Some(basename) => {
                if !self.basenames.contains(basename) {
                    tracing::warn!(target: LOG_TARGET, "basename not registered");
                    return Err(EpidError::BasenameNotRegistered);
                }
                let (b, _counter) = hash_to_g1(basename, alg)?;
                Some(b)
            }
            None => None,
        };

        let commit = self.custodian.sign_commit(b_in)?;
        let c = sign_challenge(
            &pub_key, &commit.b, &commit.k, &commit.t, &commit.r1, &commit.r2, msg, alg,
        );
        let response = match self.custodian.sign_response(c) {
            Ok(response) => response,
            Err(e) => {
                self.custodian.reset();
                return Err(e);
            }
        };

        let sigma0 = BasicSignature {
            b: commit.b,
            k: commit.k,
            t: commit.t,
            c,
            sx: response.sx,
            sf: response.sf,
            sa: response.sa,
            sb: response.sb,
        };

        let mut revoked = false;
        let mut proofs = Vec::new();
        if let Some(rl) = sig_rl {
            proofs.reserve(rl.entries.len());
            for entry in &rl.entries {
                let nr_commit = match self.custodian.nr_commit(&sigma0.b, &sigma0.k, entry) {
                    Ok(nr_commit) => nr_commit,
                    Err(e) => {
                        self.custodian.reset();
                        return Err(e);
                    }
                };
                let c_i = nr_challenge(
                    &sigma0.b,
                    &sigma0.k,
                    entry,
                    &nr_commit.t,
                    &nr_commit.r1,
                    &nr_commit.r2,
                    msg,
                    alg,
                );
                let nr_response = match self.custodian.nr_response(c_i) {
                    Ok(nr_response) => nr_response,
                    Err(e) => {
                        self.custodian.reset();
                        return Err(e);
                    }
                };
                // An identity T means this entry was produced by our own
                // secret. The proof is still emitted well-formed; only the
                // overall outcome changes.
                if nr_commit.t.is_zero() {
                    revoked = true;
                }
                proofs.push(NrProof {
                    t: nr_commit.t,
                    c: c_i,
                    smu: nr_response.smu,
                    snu: nr_response.snu,
                });
            }
        }

        let signature = EpidSignature {
            sigma0,
            rl_ver: sig_rl.map_or(0, |rl| rl.version),
            proofs,
        };
        out.copy_from_slice(&signature.to_bytes());

        if revoked {
            tracing::debug!(target: LOG_TARGET, "member is revoked in the signature revocation list");
            Ok(SigStatus::RevokedInSigRl)
        } else {
            Ok(SigStatus::Valid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{test_params, TestGroup};
    use super::*;
    use crate::math::hash::HashAlg;
    use crate::math::{Fp, G1Affine};
    use crate::types::{GroupId, SigRl, SigRlEntry};
    use crate::MemberContext;
    use ark_ec::CurveGroup;
    use ark_ff::UniformRand;
    use ark_std::test_rng;

    fn provisioned_ctx<'rl>(
        rng: &mut impl rand::RngCore,
    ) -> (MemberContext<'rl>, TestGroup, Fp) {
        let group = TestGroup::new(GroupId([0u8; 16]), rng);
        let f = Fp::rand(rng);
        let priv_key = group.issue(f, rng);
        let mut ctx = MemberContext::create(test_params()).unwrap();
        ctx.provision_key(&group.pub_key, &priv_key, None).unwrap();
        (ctx, group, f)
    }

    #[test]
    fn sign_unprovisioned_is_out_of_sequence() {
        let mut ctx = MemberContext::create(test_params()).unwrap();
        let mut out = [0u8; 360];
        assert_eq!(
            ctx.sign(b"test1", None, &mut out),
            Err(EpidError::OutOfSequence)
        );
    }

    #[test]
    fn random_base_signature_has_consistent_k() {
        let mut rng = test_rng();
        let (mut ctx, _, f) = provisioned_ctx(&mut rng);
        let mut out = vec![0u8; ctx.signature_size()];
        assert_eq!(ctx.sign(b"test1", None, &mut out).unwrap(), SigStatus::Valid);

        let sig = EpidSignature::from_bytes(&out).unwrap();
        assert!(!sig.sigma0.b.is_zero());
        assert_eq!(sig.sigma0.k, (sig.sigma0.b * f).into_affine());
        assert_eq!(sig.rl_ver, 0);
        assert!(sig.proofs.is_empty());
    }

    #[test]
    fn basename_signature_pins_b_and_requires_registration() {
        let mut rng = test_rng();
        let (mut ctx, _, _) = provisioned_ctx(&mut rng);
        let mut out = vec![0u8; ctx.signature_size()];

        assert_eq!(
            ctx.sign(b"msg", Some(b"basename1"), &mut out),
            Err(EpidError::BasenameNotRegistered)
        );

        ctx.register_basename(b"basename1").unwrap();
        ctx.sign(b"msg", Some(b"basename1"), &mut out).unwrap();
        let sig = EpidSignature::from_bytes(&out).unwrap();
        let (expected_b, _) = hash_to_g1(b"basename1", HashAlg::Sha256).unwrap();
        assert_eq!(sig.sigma0.b, expected_b);
    }

    #[test]
    fn basename_k_is_deterministic_but_rest_randomized() {
        let mut rng = test_rng();
        let (mut ctx, _, _) = provisioned_ctx(&mut rng);
        ctx.register_basename(b"bsn0").unwrap();
        let mut out1 = vec![0u8; ctx.signature_size()];
        let mut out2 = vec![0u8; ctx.signature_size()];
        ctx.sign(b"msg", Some(b"bsn0"), &mut out1).unwrap();
        ctx.sign(b"msg", Some(b"bsn0"), &mut out2).unwrap();
        let sig1 = EpidSignature::from_bytes(&out1).unwrap();
        let sig2 = EpidSignature::from_bytes(&out2).unwrap();
        // Same pseudonym, fresh randomness everywhere else.
        assert_eq!(sig1.sigma0.k, sig2.sigma0.k);
        assert_ne!(sig1.sigma0.t, sig2.sigma0.t);
        assert_ne!(sig1.sigma0.c, sig2.sigma0.c);
    }

    #[test]
    fn buffer_length_must_match_exactly() {
        let mut rng = test_rng();
        let (mut ctx, _, _) = provisioned_ctx(&mut rng);
        let size = ctx.signature_size();
        let mut small = vec![0u8; size - 1];
        assert_eq!(ctx.sign(b"m", None, &mut small), Err(EpidError::NoMem));
        let mut big = vec![0u8; size + 1];
        assert_eq!(ctx.sign(b"m", None, &mut big), Err(EpidError::BadSignature));
    }

    fn foreign_entry(rng: &mut impl rand::RngCore) -> SigRlEntry {
        let p = crate::math::params();
        let b = (p.g1 * Fp::rand(rng)).into_affine();
        SigRlEntry {
            b,
            k: (b * Fp::rand(rng)).into_affine(),
        }
    }

    #[test]
    fn sig_rl_produces_one_proof_per_entry() {
        let mut rng = test_rng();
        let group = TestGroup::new(GroupId([0u8; 16]), &mut rng);
        let priv_key = group.issue(Fp::rand(&mut rng), &mut rng);

        // Five entries from other members. The list outlives the context
        // that borrows it.
        let rl = SigRl {
            gid: group.pub_key.gid,
            version: 3,
            entries: (0..5).map(|_| foreign_entry(&mut rng)).collect(),
        };

        let mut ctx = MemberContext::create(test_params()).unwrap();
        ctx.provision_key(&group.pub_key, &priv_key, None).unwrap();
        ctx.set_sig_rl(&rl).unwrap();

        assert_eq!(ctx.signature_size(), 1160);
        let mut out = vec![0u8; 1160];
        assert_eq!(ctx.sign(b"test2", None, &mut out).unwrap(), SigStatus::Valid);

        let sig = EpidSignature::from_bytes(&out).unwrap();
        assert_eq!(sig.rl_ver, 3);
        assert_eq!(sig.proofs.len(), 5);
        for proof in &sig.proofs {
            assert!(!proof.t.is_zero());
        }
    }

    #[test]
    fn own_entry_in_sig_rl_flags_revocation() {
        let mut rng = test_rng();
        let group = TestGroup::new(GroupId([0u8; 16]), &mut rng);
        let f = Fp::rand(&mut rng);
        let priv_key = group.issue(f, &mut rng);
        let p = crate::math::params();

        let own_b: G1Affine = (p.g1 * Fp::rand(&mut rng)).into_affine();
        let own_entry = SigRlEntry {
            b: own_b,
            k: (own_b * f).into_affine(),
        };
        let rl = SigRl {
            gid: group.pub_key.gid,
            version: 1,
            entries: vec![foreign_entry(&mut rng), own_entry, foreign_entry(&mut rng)],
        };

        let mut ctx = MemberContext::create(test_params()).unwrap();
        ctx.provision_key(&group.pub_key, &priv_key, None).unwrap();
        ctx.set_sig_rl(&rl).unwrap();

        let mut out = vec![0u8; ctx.signature_size()];
        assert_eq!(
            ctx.sign(b"m", None, &mut out).unwrap(),
            SigStatus::RevokedInSigRl
        );

        // The emitted signature is fully well-formed: the matching entry has
        // an identity T, the others do not.
        let sig = EpidSignature::from_bytes(&out).unwrap();
        assert_eq!(sig.proofs.len(), 3);
        assert!(!sig.proofs[0].t.is_zero());
        assert!(sig.proofs[1].t.is_zero());
        assert!(!sig.proofs[2].t.is_zero());
    }

    #[test]
    fn presig_pool_drains_one_per_signature() {
        let mut rng = test_rng();
        let (mut ctx, _, _) = provisioned_ctx(&mut rng);
        ctx.add_presigs(3).unwrap();
        assert_eq!(ctx.num_presigs(), 3);
        let mut out = vec![0u8; ctx.signature_size()];
        ctx.sign(b"m", None, &mut out).unwrap();
        assert_eq!(ctx.num_presigs(), 2);
    }

    #[test]
    fn huge_basename_signs() {
        let mut rng = test_rng();
        let (mut ctx, _, _) = provisioned_ctx(&mut rng);
        let basename: Vec<u8> = (0..1024 * 1024).map(|i| (i % 256) as u8).collect();
        ctx.register_basename(&basename).unwrap();
        let mut out = vec![0u8; ctx.signature_size()];
        assert_eq!(
            ctx.sign(b"msg0", Some(&basename), &mut out).unwrap(),
            SigStatus::Valid
        );
    }
}
