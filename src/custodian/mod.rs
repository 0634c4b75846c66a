//! The secret custodian: sole holder of the member secret `f`.
//!
//! Every operation that touches `f` funnels through this component: the
//! join, sign, and non-revoked-proof commit/response pairs, compressed-key
//! decompression, and the pre-computed signature pool. Each protocol is a
//! strict two-phase exchange; a response is only valid directly after its
//! matching commit, which is what prevents nonce reuse. The contract is the
//! same for every back-end; [`SoftwareCustodian`] does the field arithmetic
//! in process, a hardware-backed implementation would keep `f` behind its
//! sealed boundary and carry opaque commit counters in its pending state.

pub mod presig;

use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ec::CurveGroup;
use ark_ff::Field;
use zeroize::Zeroize;

use crate::error::{EpidError, Result};
use crate::math::hash::hash_to_fp;
use crate::math::rand::{random_fp_nonzero, BitSupplier};
use crate::math::{Fp, G1Affine, G1Projective, Gt};
use crate::member::validatekey::membership_holds;
use crate::types::{CompressedPrivKey, GroupPubKey, SigRlEntry};
use presig::{compute_presig, PreComputedSignature, PresigPool, PresigScalars};

const LOG_TARGET: &str = "epid_member::custodian";

/// Non-secret key material the custodian needs for pre-computation:
/// the group points, the credential `(A, x)`, and the four pairing values.
#[derive(Debug, Clone)]
pub struct CustodianKey {
    pub h1: G1Affine,
    pub h2: G1Affine,
    pub a: G1Affine,
    pub x: Fp,
    pub e12: Gt,
    pub e22: Gt,
    pub e2w: Gt,
    pub ea2: Gt,
}

/// Output of the join commit phase.
pub struct JoinCommit {
    /// `F = h1^f`
    pub f: G1Affine,
    /// `R = h1^r`
    pub r: G1Affine,
}

/// Output of the sign commit phase.
pub struct SignCommit {
    pub b: G1Affine,
    pub k: G1Affine,
    pub t: G1Affine,
    pub r1: G1Affine,
    pub r2: Gt,
}

/// Responses of the sign protocol.
pub struct SignResponse {
    pub sx: Fp,
    pub sf: Fp,
    pub sa: Fp,
    pub sb: Fp,
}

/// Output of the non-revoked-proof commit phase.
pub struct NrCommit {
    pub t: G1Affine,
    pub r1: G1Affine,
    pub r2: G1Affine,
}

/// Responses of the non-revoked proof.
pub struct NrResponse {
    pub smu: Fp,
    pub snu: Fp,
}

/// The custodian contract. Back-end selection is a construction-time choice
/// of the member context.
pub trait SecretCustodian {
    /// Provisions or replaces the secret. Any pending two-phase operation is
    /// dropped and the state machine returns to idle.
    fn provision_f(&mut self, f: Fp);

    fn has_f(&self) -> bool;

    /// Installs the non-secret key material used by pre-computation. Clears
    /// the presig pool, which depended on the previous material.
    fn provision_key(&mut self, key: CustodianKey);

    /// Checks the membership equation for `(pub_key, a, x)` against the
    /// custodian's `f`. False when no `f` is present.
    fn is_key_valid(&self, pub_key: &GroupPubKey, a: &G1Affine, x: &Fp) -> bool;

    fn join_commit(&mut self, h1: &G1Affine) -> Result<JoinCommit>;
    fn join_response(&mut self, c: Fp) -> Result<Fp>;

    fn sign_commit(&mut self, b_in: Option<G1Affine>) -> Result<SignCommit>;
    fn sign_response(&mut self, c: Fp) -> Result<SignResponse>;

    fn nr_commit(&mut self, b: &G1Affine, k: &G1Affine, entry: &SigRlEntry) -> Result<NrCommit>;
    fn nr_response(&mut self, c: Fp) -> Result<NrResponse>;

    /// Decompresses a compressed key against `pub_key`. On success the
    /// custodian holds the derived `f` and the caller receives `(A, x)`.
    fn decompress(
        &mut self,
        pub_key: &GroupPubKey,
        compressed: &CompressedPrivKey,
    ) -> Result<(G1Affine, Fp)>;

    fn add_presigs(&mut self, n: usize) -> Result<()>;
    fn num_presigs(&self) -> usize;

    /// Drops any pending two-phase state, zeroizing its scalars.
    fn reset(&mut self);
}

struct JoinPending {
    r: Fp,
}

impl Drop for JoinPending {
    fn drop(&mut self) {
        self.r.zeroize();
    }
}

struct SignPending {
    scalars: PresigScalars,
    /// Whether the consumed presig came from the pool and must be popped
    /// once the response completes.
    pooled: bool,
}

struct NrPending {
    mu: Fp,
    nu: Fp,
    rmu: Fp,
    rnu: Fp,
}

impl Drop for NrPending {
    fn drop(&mut self) {
        self.mu.zeroize();
        self.nu.zeroize();
        self.rmu.zeroize();
        self.rnu.zeroize();
    }
}

enum Pending {
    Idle,
    Join(JoinPending),
    Sign(SignPending),
    Nr(NrPending),
}

/// In-process custodian back-end.
pub struct SoftwareCustodian {
    supplier: Box<dyn BitSupplier>,
    max_rand_iters: u32,
    f: Option<Fp>,
    key: Option<CustodianKey>,
    pending: Pending,
    pool: PresigPool,
}

impl SoftwareCustodian {
    pub fn new(supplier: Box<dyn BitSupplier>, max_rand_iters: u32, max_presigs: usize) -> Self {
        Self {
            supplier,
            max_rand_iters,
            f: None,
            key: None,
            pending: Pending::Idle,
            pool: PresigPool::new(max_presigs),
        }
    }

    fn rand_fp(&mut self) -> Result<Fp> {
        random_fp_nonzero(self.supplier.as_mut(), self.max_rand_iters)
    }

    /// Generates `f` on first use if none was seeded.
    fn ensure_f(&mut self) -> Result<Fp> {
        if let Some(f) = self.f {
            return Ok(f);
        }
        let f = self.rand_fp()?;
        tracing::debug!(target: LOG_TARGET, "generated member secret at first use");
        self.f = Some(f);
        Ok(f)
    }
}

impl SecretCustodian for SoftwareCustodian {
    fn provision_f(&mut self, f: Fp) {
        if let Some(old) = self.f.as_mut() {
            old.zeroize();
        }
        self.f = Some(f);
        self.pending = Pending::Idle;
        self.pool.clear();
    }

    fn has_f(&self) -> bool {
        self.f.is_some()
    }

    fn provision_key(&mut self, key: CustodianKey) {
        self.key = Some(key);
        self.pending = Pending::Idle;
        self.pool.clear();
    }

    fn is_key_valid(&self, pub_key: &GroupPubKey, a: &G1Affine, x: &Fp) -> bool {
        match self.f {
            Some(f) => membership_holds(pub_key, a, x, &f),
            None => false,
        }
    }

    fn join_commit(&mut self, h1: &G1Affine) -> Result<JoinCommit> {
        if !matches!(self.pending, Pending::Idle) {
            // A sequence violation drops the pending commit; the state
            // machine is idle again afterwards.
            self.pending = Pending::Idle;
            return Err(EpidError::OutOfSequence);
        }
        let f = self.ensure_f()?;
        let f_pt = (*h1 * f).into_affine();
        let r = self.rand_fp()?;
        let r_pt = (*h1 * r).into_affine();
        self.pending = Pending::Join(JoinPending { r });
        Ok(JoinCommit { f: f_pt, r: r_pt })
    }

    fn join_response(&mut self, c: Fp) -> Result<Fp> {
        let pending = match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Join(pending) => pending,
            _ => return Err(EpidError::OutOfSequence),
        };
        let f = self.f.ok_or(EpidError::OutOfSequence)?;
        Ok(pending.r + c * f)
    }

    fn sign_commit(&mut self, b_in: Option<G1Affine>) -> Result<SignCommit> {
        if !matches!(self.pending, Pending::Idle) {
            self.pending = Pending::Idle;
            return Err(EpidError::OutOfSequence);
        }
        let f = self.f.ok_or(EpidError::OutOfSequence)?;
        let key = self.key.as_ref().ok_or(EpidError::OutOfSequence)?;

        let (presig, pooled) = match self.pool.top() {
            Some(top) => (top.clone(), true),
            None => {
                let fresh = compute_presig(self.supplier.as_mut(), self.max_rand_iters, key, &f)?;
                if self.pool.capacity() > 0 {
                    self.pool.push_many(vec![fresh.clone()])?;
                    (fresh, true)
                } else {
                    (fresh, false)
                }
            }
        };

        let (b, k, r1) = match b_in {
            // A caller-chosen base replaces the random one; K and R1 are
            // recomputed against it.
            Some(b) => {
                let k = (b * f).into_affine();
                let r1 = (b * presig.scalars.rf).into_affine();
                (b, k, r1)
            }
            None => (presig.b, presig.k, presig.r1),
        };

        let commit = SignCommit {
            b,
            k,
            t: presig.t,
            r1,
            r2: presig.r2,
        };
        self.pending = Pending::Sign(SignPending {
            scalars: presig.scalars.clone(),
            pooled,
        });
        Ok(commit)
    }

    fn sign_response(&mut self, c: Fp) -> Result<SignResponse> {
        let pending = match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Sign(pending) => pending,
            _ => return Err(EpidError::OutOfSequence),
        };
        let f = self.f.ok_or(EpidError::OutOfSequence)?;
        let key = self.key.as_ref().ok_or(EpidError::OutOfSequence)?;

        let response = SignResponse {
            sx: pending.scalars.rx + c * key.x,
            sf: pending.scalars.rf + c * f,
            sa: pending.scalars.ra + c * pending.scalars.a,
            sb: pending.scalars.rb + c * pending.scalars.b,
        };
        // The presig is consumed only now that the response exists.
        if pending.pooled {
            self.pool.pop();
        }
        Ok(response)
    }

    fn nr_commit(&mut self, b: &G1Affine, k: &G1Affine, entry: &SigRlEntry) -> Result<NrCommit> {
        if !matches!(self.pending, Pending::Idle) {
            self.pending = Pending::Idle;
            return Err(EpidError::OutOfSequence);
        }
        let f = self.f.ok_or(EpidError::OutOfSequence)?;

        let mu = self.rand_fp()?;
        let nu = -(f * mu);
        let rmu = self.rand_fp()?;
        let rnu = self.rand_fp()?;

        let t: G1Projective = entry.k * mu + entry.b * nu;
        let r1: G1Projective = *k * rmu + *b * rnu;
        let r2: G1Projective = entry.k * rmu + entry.b * rnu;

        self.pending = Pending::Nr(NrPending { mu, nu, rmu, rnu });
        Ok(NrCommit {
            t: t.into_affine(),
            r1: r1.into_affine(),
            r2: r2.into_affine(),
        })
    }

    fn nr_response(&mut self, c: Fp) -> Result<NrResponse> {
        let pending = match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Nr(pending) => pending,
            _ => return Err(EpidError::OutOfSequence),
        };
        Ok(NrResponse {
            smu: pending.rmu + c * pending.mu,
            snu: pending.rnu + c * pending.nu,
        })
    }

    fn decompress(
        &mut self,
        pub_key: &GroupPubKey,
        compressed: &CompressedPrivKey,
    ) -> Result<(G1Affine, Fp)> {
        let alg = pub_key.gid.hash_alg()?;

        let mut kdf_input = [0u8; 36];
        kdf_input[..32].copy_from_slice(&compressed.seed);
        kdf_input[32..].copy_from_slice(&0u32.to_be_bytes());
        let x = hash_to_fp(&kdf_input, alg);
        kdf_input[32..].copy_from_slice(&1u32.to_be_bytes());
        let mut f = hash_to_fp(&kdf_input, alg);
        kdf_input.zeroize();

        let y2 = compressed.ax * compressed.ax * compressed.ax + ark_bn254::g1::Config::COEFF_B;
        let y = match y2.sqrt() {
            Some(y) => y,
            None => {
                f.zeroize();
                tracing::warn!(target: LOG_TARGET, "compressed A.x is not on the curve");
                return Err(EpidError::KeyNotInGroup);
            }
        };

        for candidate_y in [y, -y] {
            let a = G1Affine::new_unchecked(compressed.ax, candidate_y);
            if !a.is_on_curve() || !a.is_in_correct_subgroup_assuming_on_curve() {
                continue;
            }
            if membership_holds(pub_key, &a, &x, &f) {
                self.provision_f(f);
                tracing::debug!(target: LOG_TARGET, "compressed key decompressed");
                return Ok((a, x));
            }
        }
        f.zeroize();
        Err(EpidError::KeyNotInGroup)
    }

    fn add_presigs(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let f = self.f.ok_or(EpidError::OutOfSequence)?;
        let key = self.key.as_ref().ok_or(EpidError::OutOfSequence)?;
        if self.pool.len() + n > self.pool.capacity() {
            return Err(EpidError::MaxEntries);
        }
        let mut batch = Vec::with_capacity(n);
        for _ in 0..n {
            batch.push(compute_presig(
                self.supplier.as_mut(),
                self.max_rand_iters,
                key,
                &f,
            )?);
        }
        self.pool.push_many(batch)
    }

    fn num_presigs(&self) -> usize {
        self.pool.len()
    }

    fn reset(&mut self) {
        self.pending = Pending::Idle;
    }
}

impl Drop for SoftwareCustodian {
    fn drop(&mut self) {
        if let Some(f) = self.f.as_mut() {
            f.zeroize();
        }
        self.pool.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::rand::testing::ConstantSupplier;
    use crate::math::rand::RngSupplier;
    use crate::math::{pairing, params, G2Projective};
    use ark_ec::AffineRepr;
    use ark_ff::UniformRand;
    use ark_std::test_rng;

    fn custodian() -> SoftwareCustodian {
        SoftwareCustodian::new(Box::new(RngSupplier(test_rng())), 16, 4)
    }

    fn fixture_key(rng: &mut impl rand::RngCore) -> CustodianKey {
        let p = params();
        let h1 = (p.g1 * Fp::rand(rng)).into_affine();
        let h2 = (p.g1 * Fp::rand(rng)).into_affine();
        let w = (G2Projective::from(p.g2) * Fp::rand(rng)).into_affine();
        let a = (p.g1 * Fp::rand(rng)).into_affine();
        CustodianKey {
            h1,
            h2,
            a,
            x: Fp::rand(rng),
            e12: pairing(&h1, &p.g2),
            e22: pairing(&h2, &p.g2),
            e2w: pairing(&h2, &w),
            ea2: pairing(&a, &p.g2),
        }
    }

    #[test]
    fn join_commit_response_sequence() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        let f = Fp::rand(&mut rng);
        custodian.provision_f(f);

        let h1 = (params().g1 * Fp::rand(&mut rng)).into_affine();
        let commit = custodian.join_commit(&h1).unwrap();
        assert_eq!(commit.f, (h1 * f).into_affine());

        let c = Fp::rand(&mut rng);
        let s = custodian.join_response(c).unwrap();
        // h1^s = R * F^c
        assert_eq!(h1 * s, G1Projective::from(commit.r) + commit.f * c);
    }

    #[test]
    fn double_commit_is_out_of_sequence() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        custodian.provision_f(Fp::rand(&mut rng));
        let h1 = params().g1;
        custodian.join_commit(&h1).unwrap();
        assert!(matches!(
            custodian.join_commit(&h1),
            Err(EpidError::OutOfSequence)
        ));
    }

    #[test]
    fn response_without_commit_is_out_of_sequence() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        custodian.provision_f(Fp::rand(&mut rng));
        assert!(matches!(
            custodian.join_response(Fp::rand(&mut rng)),
            Err(EpidError::OutOfSequence)
        ));
        assert!(matches!(
            custodian.sign_response(Fp::rand(&mut rng)),
            Err(EpidError::OutOfSequence)
        ));
        assert!(matches!(
            custodian.nr_response(Fp::rand(&mut rng)),
            Err(EpidError::OutOfSequence)
        ));
    }

    #[test]
    fn mismatched_commit_response_pairs_are_rejected() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        custodian.provision_f(Fp::rand(&mut rng));
        custodian.join_commit(&params().g1).unwrap();
        // A sign response cannot answer a join commit; the pending commit
        // is dropped by the violation.
        assert!(matches!(
            custodian.sign_response(Fp::rand(&mut rng)),
            Err(EpidError::OutOfSequence)
        ));
        assert!(matches!(
            custodian.join_response(Fp::rand(&mut rng)),
            Err(EpidError::OutOfSequence)
        ));
        // A fresh commit/response pair works again.
        custodian.join_commit(&params().g1).unwrap();
        custodian.join_response(Fp::rand(&mut rng)).unwrap();
    }

    #[test]
    fn provision_f_clears_pending_commit() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        custodian.provision_f(Fp::rand(&mut rng));
        custodian.join_commit(&params().g1).unwrap();
        custodian.provision_f(Fp::rand(&mut rng));
        assert!(matches!(
            custodian.join_response(Fp::rand(&mut rng)),
            Err(EpidError::OutOfSequence)
        ));
    }

    #[test]
    fn sign_commit_consumes_presig_on_response() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        custodian.provision_f(Fp::rand(&mut rng));
        custodian.provision_key(fixture_key(&mut rng));
        custodian.add_presigs(2).unwrap();
        assert_eq!(custodian.num_presigs(), 2);

        custodian.sign_commit(None).unwrap();
        assert_eq!(custodian.num_presigs(), 2);
        custodian.sign_response(Fp::rand(&mut rng)).unwrap();
        assert_eq!(custodian.num_presigs(), 1);
    }

    #[test]
    fn sign_commit_with_empty_pool_computes_one() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        custodian.provision_f(Fp::rand(&mut rng));
        custodian.provision_key(fixture_key(&mut rng));
        assert_eq!(custodian.num_presigs(), 0);
        custodian.sign_commit(None).unwrap();
        custodian.sign_response(Fp::rand(&mut rng)).unwrap();
        assert_eq!(custodian.num_presigs(), 0);
    }

    #[test]
    fn sign_commit_with_basename_base_recomputes_k_and_r1() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        let f = Fp::rand(&mut rng);
        custodian.provision_f(f);
        custodian.provision_key(fixture_key(&mut rng));

        let b_in = (params().g1 * Fp::rand(&mut rng)).into_affine();
        let commit = custodian.sign_commit(Some(b_in)).unwrap();
        assert_eq!(commit.b, b_in);
        assert_eq!(commit.k, (b_in * f).into_affine());
    }

    #[test]
    fn nr_commit_t_is_identity_iff_entry_matches_member() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        let f = Fp::rand(&mut rng);
        custodian.provision_f(f);

        let b = (params().g1 * Fp::rand(&mut rng)).into_affine();
        let k = (b * f).into_affine();

        // Entry generated by this member: T must be the identity.
        let revoked_entry = SigRlEntry { b, k };
        let commit = custodian.nr_commit(&b, &k, &revoked_entry).unwrap();
        assert!(commit.t.is_zero());
        custodian.nr_response(Fp::rand(&mut rng)).unwrap();

        // Entry from a different member: T must not be the identity.
        let other_f = Fp::rand(&mut rng);
        let other_entry = SigRlEntry {
            b,
            k: (b * other_f).into_affine(),
        };
        let commit = custodian.nr_commit(&b, &k, &other_entry).unwrap();
        assert!(!commit.t.is_zero());
    }

    #[test]
    fn nr_proof_equations_hold() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        let f = Fp::rand(&mut rng);
        custodian.provision_f(f);

        let b = (params().g1 * Fp::rand(&mut rng)).into_affine();
        let k = (b * f).into_affine();
        let entry = SigRlEntry {
            b: (params().g1 * Fp::rand(&mut rng)).into_affine(),
            k: (params().g1 * Fp::rand(&mut rng)).into_affine(),
        };

        let commit = custodian.nr_commit(&b, &k, &entry).unwrap();
        let c = Fp::rand(&mut rng);
        let response = custodian.nr_response(c).unwrap();

        // K^smu * B^snu = R1 (the member terms cancel)
        assert_eq!(
            k * response.smu + b * response.snu,
            G1Projective::from(commit.r1)
        );
        // K'^smu * B'^snu = R2 * T^c
        assert_eq!(
            entry.k * response.smu + entry.b * response.snu,
            G1Projective::from(commit.r2) + commit.t * c
        );
    }

    #[test]
    fn add_presigs_respects_cap_and_rolls_back() {
        let mut rng = test_rng();
        let mut custodian = custodian();
        custodian.provision_f(Fp::rand(&mut rng));
        custodian.provision_key(fixture_key(&mut rng));
        custodian.add_presigs(3).unwrap();
        assert_eq!(custodian.num_presigs(), 3);
        assert_eq!(custodian.add_presigs(2), Err(EpidError::MaxEntries));
        assert_eq!(custodian.num_presigs(), 3);
    }

    #[test]
    fn failing_supplier_leaves_pool_unchanged() {
        let mut rng = test_rng();
        let key = fixture_key(&mut rng);
        let mut custodian = SoftwareCustodian::new(Box::new(ConstantSupplier(0)), 4, 4);
        custodian.provision_f(Fp::rand(&mut rng));
        custodian.provision_key(key);
        assert_eq!(custodian.add_presigs(2), Err(EpidError::RandMaxIter));
        assert_eq!(custodian.num_presigs(), 0);
    }
}
