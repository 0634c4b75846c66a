//! Member context: the public orchestration layer.
//!
//! A context represents membership in a single group. It owns the secret
//! custodian, the basename allow-list, and the cached pre-computation;
//! it borrows the signature revocation list from the caller. Provisioning
//! is a separate step from construction, and a context can be re-provisioned
//! into a different group, which swaps the key material wholesale.

mod join;
pub mod precomp;
mod sign;
pub mod storage;
pub(crate) mod validatekey;

use crate::basename::AllowedBasenames;
use crate::custodian::{CustodianKey, SecretCustodian, SoftwareCustodian};
use crate::error::{EpidError, Result};
use crate::math::hash::HashAlg;
use crate::math::rand::{BitSupplier, DEFAULT_MAX_RAND_ITERS};
use crate::types::{
    CompressedPrivKey, GroupPubKey, MemberPrecomp, MembershipCredential, PrivKey, SigRl,
};
use precomp::{compute_member_precomp, validate_precomp, PrecompCache};
use storage::NvStorage;

const LOG_TARGET: &str = "epid_member::member";

pub const DEFAULT_MAX_SIGRL_ENTRIES: usize = 1024;
pub const DEFAULT_MAX_ALLOWED_BASENAMES: usize = 128;
pub const DEFAULT_MAX_PRECOMP_SIG: usize = 64;

/// Construction parameters for a member context.
pub struct MemberParams {
    /// Random-bit source. Must be cryptographically secure in production.
    pub supplier: Box<dyn BitSupplier>,
    /// Optional member secret. When absent, a secret is generated uniformly
    /// at first use.
    pub f: Option<crate::math::Fp>,
    pub max_sigrl_entries: usize,
    pub max_allowed_basenames: usize,
    pub max_precomp_sig: usize,
    pub max_rand_iters: u32,
    /// Optional non-volatile storage for the credential slot.
    pub nv: Option<Box<dyn NvStorage>>,
}

impl MemberParams {
    pub fn new(supplier: Box<dyn BitSupplier>) -> Self {
        Self {
            supplier,
            f: None,
            max_sigrl_entries: DEFAULT_MAX_SIGRL_ENTRIES,
            max_allowed_basenames: DEFAULT_MAX_ALLOWED_BASENAMES,
            max_precomp_sig: DEFAULT_MAX_PRECOMP_SIG,
            max_rand_iters: DEFAULT_MAX_RAND_ITERS,
            nv: None,
        }
    }
}

/// Member context. `'rl` is the lifetime of the borrowed revocation list.
pub struct MemberContext<'rl> {
    custodian: Box<dyn SecretCustodian>,
    pub_key: Option<GroupPubKey>,
    credential: Option<MembershipCredential>,
    hash_alg: Option<HashAlg>,
    sig_rl: Option<&'rl SigRl>,
    basenames: AllowedBasenames,
    precomp: Option<PrecompCache>,
    nv: Option<Box<dyn NvStorage>>,
    max_sigrl_entries: usize,
}

impl<'rl> MemberContext<'rl> {
    /// Creates an unprovisioned context.
    pub fn create(params: MemberParams) -> Result<Self> {
        let MemberParams {
            supplier,
            f,
            max_sigrl_entries,
            max_allowed_basenames,
            max_precomp_sig,
            max_rand_iters,
            nv,
        } = params;
        if max_rand_iters == 0 {
            return Err(EpidError::BadConfig);
        }
        let mut custodian = SoftwareCustodian::new(supplier, max_rand_iters, max_precomp_sig);
        if let Some(f) = f {
            custodian.provision_f(f);
        }
        Ok(Self {
            custodian: Box::new(custodian),
            pub_key: None,
            credential: None,
            hash_alg: None,
            sig_rl: None,
            basenames: AllowedBasenames::new(max_allowed_basenames),
            precomp: None,
            nv,
            max_sigrl_entries,
        })
    }

    /// Provisions the member with a full private key.
    pub fn provision_key(
        &mut self,
        pub_key: &GroupPubKey,
        priv_key: &PrivKey,
        precomp: Option<&MemberPrecomp>,
    ) -> Result<()> {
        if pub_key.gid.0 != priv_key.gid.0 {
            return Err(EpidError::GroupIdMismatch);
        }
        let alg = pub_key.gid.hash_alg()?;
        if !validatekey::is_priv_key_in_group(pub_key, priv_key) {
            tracing::warn!(target: LOG_TARGET, "private key failed membership equation");
            return Err(EpidError::KeyNotInGroup);
        }
        let precomp = self.resolve_precomp(pub_key, &priv_key.a, precomp)?;
        self.custodian.provision_f(priv_key.f);
        self.install_group(pub_key, MembershipCredential::from(priv_key), precomp, alg)
    }

    /// Provisions from a compressed key by decompressing it first.
    pub fn provision_compressed(
        &mut self,
        pub_key: &GroupPubKey,
        key: &CompressedPrivKey,
        precomp: Option<&MemberPrecomp>,
    ) -> Result<()> {
        if pub_key.gid.0 != key.gid.0 {
            return Err(EpidError::GroupIdMismatch);
        }
        let alg = pub_key.gid.hash_alg()?;
        // Decompression validates the membership equation and leaves the
        // derived f in the custodian.
        let (a, x) = self.custodian.decompress(pub_key, key)?;
        let precomp = self.resolve_precomp(pub_key, &a, precomp)?;
        let credential = MembershipCredential {
            gid: pub_key.gid,
            a,
            x,
        };
        self.install_group(pub_key, credential, precomp, alg)
    }

    /// Provisions from a bare membership credential, pairing it with the
    /// custodian's already-present secret.
    pub fn provision_credential(
        &mut self,
        pub_key: &GroupPubKey,
        credential: &MembershipCredential,
        precomp: Option<&MemberPrecomp>,
    ) -> Result<()> {
        if pub_key.gid.0 != credential.gid.0 {
            return Err(EpidError::GroupIdMismatch);
        }
        let alg = pub_key.gid.hash_alg()?;
        if !self.custodian.has_f() {
            return Err(EpidError::OutOfSequence);
        }
        if !self
            .custodian
            .is_key_valid(pub_key, &credential.a, &credential.x)
        {
            tracing::warn!(target: LOG_TARGET, "credential does not match member secret");
            return Err(EpidError::KeyNotInGroup);
        }
        let precomp = self.resolve_precomp(pub_key, &credential.a, precomp)?;
        self.install_group(pub_key, credential.clone(), precomp, alg)
    }

    /// Loads persisted key material from the NV slot. Falls back to the
    /// in-context credential when the slot is empty.
    pub fn startup(&mut self) -> Result<()> {
        let loaded = match self.nv.as_deref() {
            Some(nv) => storage::read_membership_credential(nv)?,
            None => None,
        };
        match loaded {
            Some((pub_key, credential)) => {
                let alg = pub_key.gid.hash_alg()?;
                if !self.custodian.has_f() {
                    return Err(EpidError::OutOfSequence);
                }
                if !self
                    .custodian
                    .is_key_valid(&pub_key, &credential.a, &credential.x)
                {
                    return Err(EpidError::UnrelatedKeyPair);
                }
                let precomp = compute_member_precomp(&pub_key, &credential.a);
                self.install_group_no_persist(&pub_key, credential, precomp, alg);
                Ok(())
            }
            None if self.credential.is_some() => Ok(()),
            None => Err(EpidError::OutOfSequence),
        }
    }

    /// Destroys the NV slot and drops the active credential.
    pub fn clear_credential(&mut self) -> Result<()> {
        if let Some(nv) = self.nv.as_deref_mut() {
            storage::clear_membership_credential(nv)?;
        }
        self.credential = None;
        self.pub_key = None;
        self.precomp = None;
        self.hash_alg = None;
        self.sig_rl = None;
        Ok(())
    }

    /// Selects the hash algorithm. Only the algorithm already encoded in the
    /// provisioned gid is accepted.
    pub fn set_hash_alg(&mut self, alg: HashAlg) -> Result<()> {
        let pub_key = self
            .pub_key
            .as_ref()
            .ok_or(EpidError::OperationNotSupported)?;
        let gid_alg = pub_key.gid.hash_alg()?;
        if alg != gid_alg {
            return Err(EpidError::OperationNotSupported);
        }
        if self.hash_alg != Some(alg) {
            // Stale precomp is recomputed lazily under the new algorithm.
            self.precomp = None;
            self.hash_alg = Some(alg);
        }
        Ok(())
    }

    /// Points the context at a revocation list. The previous list stays
    /// active when the new one is rejected.
    pub fn set_sig_rl(&mut self, sig_rl: &'rl SigRl) -> Result<()> {
        let pub_key = self.pub_key.as_ref().ok_or(EpidError::OutOfSequence)?;
        if sig_rl.gid.0 != pub_key.gid.0 {
            tracing::warn!(target: LOG_TARGET, "revocation list gid mismatch");
            return Err(EpidError::BadSigRl);
        }
        if sig_rl.entries.len() > self.max_sigrl_entries {
            return Err(EpidError::BadSigRl);
        }
        if let Some(current) = self.sig_rl {
            if sig_rl.version <= current.version {
                tracing::warn!(
                    target: LOG_TARGET,
                    current = current.version,
                    incoming = sig_rl.version,
                    "revocation list version regression"
                );
                return Err(EpidError::VersionMismatch);
            }
        }
        self.sig_rl = Some(sig_rl);
        Ok(())
    }

    pub fn register_basename(&mut self, basename: &[u8]) -> Result<()> {
        self.basenames.register(basename)
    }

    pub fn clear_basenames(&mut self) {
        self.basenames.clear();
    }

    /// Extends the pre-computed signature pool by `n` entries.
    pub fn add_presigs(&mut self, n: usize) -> Result<()> {
        self.custodian.add_presigs(n)
    }

    pub fn num_presigs(&self) -> usize {
        self.custodian.num_presigs()
    }

    /// Exports the pre-computation for a key/credential pair. Byte-for-byte
    /// deterministic; the cached values are reused when the pair is the
    /// provisioned one.
    pub fn write_precomp(
        &self,
        pub_key: &GroupPubKey,
        credential: &MembershipCredential,
    ) -> Result<MemberPrecomp> {
        if pub_key.gid.0 != credential.gid.0 {
            return Err(EpidError::GroupIdMismatch);
        }
        if let (Some(cache), Some(active_key), Some(active_cred)) =
            (&self.precomp, &self.pub_key, &self.credential)
        {
            if active_key == pub_key && active_cred == credential {
                return Ok(cache.value);
            }
        }
        Ok(compute_member_precomp(pub_key, &credential.a))
    }

    pub(crate) fn is_provisioned(&self) -> bool {
        self.pub_key.is_some() && self.credential.is_some()
    }

    /// Recomputes the cached precomp (and re-provisions the custodian's key
    /// material) if a hash-algorithm change invalidated it.
    pub(crate) fn ensure_precomp(&mut self) -> Result<()> {
        let (pub_key, credential) = match (&self.pub_key, &self.credential) {
            (Some(pub_key), Some(credential)) => (pub_key.clone(), credential.clone()),
            _ => return Err(EpidError::OutOfSequence),
        };
        let alg = self.hash_alg.ok_or(EpidError::OutOfSequence)?;
        let stale = self
            .precomp
            .as_ref()
            .map(|cache| cache.alg != alg)
            .unwrap_or(true);
        if stale {
            let precomp = compute_member_precomp(&pub_key, &credential.a);
            self.custodian.provision_key(CustodianKey {
                h1: pub_key.h1,
                h2: pub_key.h2,
                a: credential.a,
                x: credential.x,
                e12: precomp.e12,
                e22: precomp.e22,
                e2w: precomp.e2w,
                ea2: precomp.ea2,
            });
            self.precomp = Some(PrecompCache { alg, value: precomp });
        }
        Ok(())
    }

    fn resolve_precomp(
        &self,
        pub_key: &GroupPubKey,
        a: &crate::math::G1Affine,
        supplied: Option<&MemberPrecomp>,
    ) -> Result<MemberPrecomp> {
        match supplied {
            Some(precomp) => validate_precomp(pub_key, a, precomp),
            None => Ok(compute_member_precomp(pub_key, a)),
        }
    }

    fn install_group(
        &mut self,
        pub_key: &GroupPubKey,
        credential: MembershipCredential,
        precomp: MemberPrecomp,
        alg: HashAlg,
    ) -> Result<()> {
        if let Some(nv) = self.nv.as_deref_mut() {
            storage::write_membership_credential(nv, pub_key, &credential)?;
        }
        self.install_group_no_persist(pub_key, credential, precomp, alg);
        Ok(())
    }

    fn install_group_no_persist(
        &mut self,
        pub_key: &GroupPubKey,
        credential: MembershipCredential,
        precomp: MemberPrecomp,
        alg: HashAlg,
    ) {
        let gid_changed = self
            .pub_key
            .as_ref()
            .map(|current| current.gid.0 != pub_key.gid.0)
            .unwrap_or(true);
        if gid_changed {
            self.sig_rl = None;
        }
        self.custodian.provision_key(CustodianKey {
            h1: pub_key.h1,
            h2: pub_key.h2,
            a: credential.a,
            x: credential.x,
            e12: precomp.e12,
            e22: precomp.e22,
            e2w: precomp.e2w,
            ea2: precomp.ea2,
        });
        self.pub_key = Some(pub_key.clone());
        self.credential = Some(credential);
        self.hash_alg = Some(alg);
        self.precomp = Some(PrecompCache { alg, value: precomp });
        tracing::debug!(target: LOG_TARGET, "member provisioned");
    }
}
