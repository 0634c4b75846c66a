//! Wire records of the member protocol.
//!
//! All records are fixed-width big-endian compositions of the primitives in
//! [`crate::codec`]. Each `from_bytes` validates shape (canonical integers,
//! on-curve and in-subgroup points, required non-identity) and reports the
//! argument-specific `Bad*` status.

use zeroize::Zeroize;

use crate::codec::{
    fp_to_bytes, fq_to_bytes, g1_to_bytes, g2_to_bytes, gt_to_bytes, read_fp, read_fq, read_g1,
    read_g2, read_gt, read_u32, write_u32, FP_SIZE, FQ_SIZE, G1_SIZE, G2_SIZE, GT_SIZE,
};
use crate::error::{EpidError, Result};
use crate::math::hash::HashAlg;
use crate::math::{Fp, Fq, G1Affine, G2Affine, Gt};
use ark_ec::AffineRepr;

/// 16-byte group identifier. The low nibble of byte 1 selects the hash
/// algorithm; the rest is opaque to the member and preserved round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(pub [u8; 16]);

pub const GID_SIZE: usize = 16;

impl GroupId {
    pub fn hash_alg(&self) -> Result<HashAlg> {
        HashAlg::from_gid_nibble(self.0[1] & 0x0f)
    }

    pub fn as_bytes(&self) -> &[u8; GID_SIZE] {
        &self.0
    }

    fn read(bytes: &[u8]) -> Self {
        let mut gid = [0u8; GID_SIZE];
        gid.copy_from_slice(&bytes[..GID_SIZE]);
        GroupId(gid)
    }
}

/// Group public key `(gid, h1, h2, w)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPubKey {
    pub gid: GroupId,
    pub h1: G1Affine,
    pub h2: G1Affine,
    pub w: G2Affine,
}

impl GroupPubKey {
    pub const SIZE: usize = GID_SIZE + 2 * G1_SIZE + G2_SIZE;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..GID_SIZE].copy_from_slice(&self.gid.0);
        out[16..80].copy_from_slice(&g1_to_bytes(&self.h1));
        out[80..144].copy_from_slice(&g1_to_bytes(&self.h2));
        out[144..272].copy_from_slice(&g2_to_bytes(&self.w));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadGroupPubKey);
        }
        let gid = GroupId::read(bytes);
        let h1 = read_g1(&bytes[16..80]).map_err(|_| EpidError::BadGroupPubKey)?;
        let h2 = read_g1(&bytes[80..144]).map_err(|_| EpidError::BadGroupPubKey)?;
        let w = read_g2(&bytes[144..272]).map_err(|_| EpidError::BadGroupPubKey)?;
        if h1.is_zero() || h2.is_zero() {
            return Err(EpidError::BadGroupPubKey);
        }
        Ok(Self { gid, h1, h2, w })
    }
}

/// Full member private key `(gid, A, x, f)`. The `f` component is wiped on
/// drop; it only ever migrates into the secret custodian.
#[derive(Debug, Clone)]
pub struct PrivKey {
    pub gid: GroupId,
    pub a: G1Affine,
    pub x: Fp,
    pub f: Fp,
}

impl PrivKey {
    pub const SIZE: usize = GID_SIZE + G1_SIZE + 2 * FP_SIZE;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..GID_SIZE].copy_from_slice(&self.gid.0);
        out[16..80].copy_from_slice(&g1_to_bytes(&self.a));
        out[80..112].copy_from_slice(&fp_to_bytes(&self.x));
        out[112..144].copy_from_slice(&fp_to_bytes(&self.f));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadPrivKey);
        }
        let gid = GroupId::read(bytes);
        let a = read_g1(&bytes[16..80]).map_err(|_| EpidError::BadPrivKey)?;
        let x = read_fp(&bytes[80..112]).map_err(|_| EpidError::BadPrivKey)?;
        let f = read_fp(&bytes[112..144]).map_err(|_| EpidError::BadPrivKey)?;
        if a.is_zero() {
            return Err(EpidError::BadPrivKey);
        }
        Ok(Self { gid, a, x, f })
    }
}

impl Drop for PrivKey {
    fn drop(&mut self) {
        self.f.zeroize();
    }
}

/// Compressed private key `(gid, Ax, seed)`. The seed is the secret; it is
/// wiped on drop and never persisted after decompression.
#[derive(Debug, Clone)]
pub struct CompressedPrivKey {
    pub gid: GroupId,
    pub ax: Fq,
    pub seed: [u8; 32],
}

impl CompressedPrivKey {
    pub const SIZE: usize = GID_SIZE + FQ_SIZE + 32;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..GID_SIZE].copy_from_slice(&self.gid.0);
        out[16..48].copy_from_slice(&fq_to_bytes(&self.ax));
        out[48..80].copy_from_slice(&self.seed);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadPrivKey);
        }
        let gid = GroupId::read(bytes);
        let ax = read_fq(&bytes[16..48]).map_err(|_| EpidError::BadPrivKey)?;
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[48..80]);
        Ok(Self { gid, ax, seed })
    }
}

impl Drop for CompressedPrivKey {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

/// Public portion of a member key `(gid, A, x)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipCredential {
    pub gid: GroupId,
    pub a: G1Affine,
    pub x: Fp,
}

impl MembershipCredential {
    pub const SIZE: usize = GID_SIZE + G1_SIZE + FP_SIZE;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..GID_SIZE].copy_from_slice(&self.gid.0);
        out[16..80].copy_from_slice(&g1_to_bytes(&self.a));
        out[80..112].copy_from_slice(&fp_to_bytes(&self.x));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadMembershipCredential);
        }
        let gid = GroupId::read(bytes);
        let a = read_g1(&bytes[16..80]).map_err(|_| EpidError::BadMembershipCredential)?;
        let x = read_fp(&bytes[80..112]).map_err(|_| EpidError::BadMembershipCredential)?;
        if a.is_zero() {
            return Err(EpidError::BadMembershipCredential);
        }
        Ok(Self { gid, a, x })
    }
}

impl From<&PrivKey> for MembershipCredential {
    fn from(key: &PrivKey) -> Self {
        Self {
            gid: key.gid,
            a: key.a,
            x: key.x,
        }
    }
}

/// The four pairing values every signature reuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberPrecomp {
    /// `e(h1, g2)`
    pub e12: Gt,
    /// `e(h2, g2)`
    pub e22: Gt,
    /// `e(h2, w)`
    pub e2w: Gt,
    /// `e(A, g2)`
    pub ea2: Gt,
}

impl MemberPrecomp {
    pub const SIZE: usize = 4 * GT_SIZE;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(&gt_to_bytes(&self.e12));
        out.extend_from_slice(&gt_to_bytes(&self.e22));
        out.extend_from_slice(&gt_to_bytes(&self.e2w));
        out.extend_from_slice(&gt_to_bytes(&self.ea2));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadPrecomp);
        }
        let e12 = read_gt(&bytes[..GT_SIZE]).map_err(|_| EpidError::BadPrecomp)?;
        let e22 = read_gt(&bytes[GT_SIZE..2 * GT_SIZE]).map_err(|_| EpidError::BadPrecomp)?;
        let e2w = read_gt(&bytes[2 * GT_SIZE..3 * GT_SIZE]).map_err(|_| EpidError::BadPrecomp)?;
        let ea2 = read_gt(&bytes[3 * GT_SIZE..]).map_err(|_| EpidError::BadPrecomp)?;
        Ok(Self { e12, e22, e2w, ea2 })
    }
}

/// 32-byte issuer-chosen nonce, used once per join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerNonce(pub [u8; 32]);

/// Join request `(F, c, s)` emitted to the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    /// `F = h1^f`
    pub f: G1Affine,
    pub c: Fp,
    pub s: Fp,
}

impl JoinRequest {
    pub const SIZE: usize = G1_SIZE + 2 * FP_SIZE;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..64].copy_from_slice(&g1_to_bytes(&self.f));
        out[64..96].copy_from_slice(&fp_to_bytes(&self.c));
        out[96..128].copy_from_slice(&fp_to_bytes(&self.s));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadJoinRequest);
        }
        let f = read_g1(&bytes[..64]).map_err(|_| EpidError::BadJoinRequest)?;
        let c = read_fp(&bytes[64..96]).map_err(|_| EpidError::BadJoinRequest)?;
        let s = read_fp(&bytes[96..128]).map_err(|_| EpidError::BadJoinRequest)?;
        if f.is_zero() {
            return Err(EpidError::BadJoinRequest);
        }
        Ok(Self { f, c, s })
    }
}

/// Basic signature `(B, K, T, c, sx, sf, sa, sb)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicSignature {
    pub b: G1Affine,
    pub k: G1Affine,
    pub t: G1Affine,
    pub c: Fp,
    pub sx: Fp,
    pub sf: Fp,
    pub sa: Fp,
    pub sb: Fp,
}

impl BasicSignature {
    pub const SIZE: usize = 3 * G1_SIZE + 5 * FP_SIZE;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..64].copy_from_slice(&g1_to_bytes(&self.b));
        out[64..128].copy_from_slice(&g1_to_bytes(&self.k));
        out[128..192].copy_from_slice(&g1_to_bytes(&self.t));
        out[192..224].copy_from_slice(&fp_to_bytes(&self.c));
        out[224..256].copy_from_slice(&fp_to_bytes(&self.sx));
        out[256..288].copy_from_slice(&fp_to_bytes(&self.sf));
        out[288..320].copy_from_slice(&fp_to_bytes(&self.sa));
        out[320..352].copy_from_slice(&fp_to_bytes(&self.sb));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadSignature);
        }
        let b = read_g1(&bytes[..64]).map_err(|_| EpidError::BadSignature)?;
        let k = read_g1(&bytes[64..128]).map_err(|_| EpidError::BadSignature)?;
        let t = read_g1(&bytes[128..192]).map_err(|_| EpidError::BadSignature)?;
        let c = read_fp(&bytes[192..224]).map_err(|_| EpidError::BadSignature)?;
        let sx = read_fp(&bytes[224..256]).map_err(|_| EpidError::BadSignature)?;
        let sf = read_fp(&bytes[256..288]).map_err(|_| EpidError::BadSignature)?;
        let sa = read_fp(&bytes[288..320]).map_err(|_| EpidError::BadSignature)?;
        let sb = read_fp(&bytes[320..352]).map_err(|_| EpidError::BadSignature)?;
        if b.is_zero() {
            return Err(EpidError::BadSignature);
        }
        Ok(Self {
            b,
            k,
            t,
            c,
            sx,
            sf,
            sa,
            sb,
        })
    }
}

/// Per-SigRL-entry non-revoked proof `(T, c, smu, snu)`. `T` is the
/// identity exactly when the signer is revoked against the entry, so the
/// identity encoding is accepted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NrProof {
    pub t: G1Affine,
    pub c: Fp,
    pub smu: Fp,
    pub snu: Fp,
}

impl NrProof {
    pub const SIZE: usize = G1_SIZE + 3 * FP_SIZE;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..64].copy_from_slice(&g1_to_bytes(&self.t));
        out[64..96].copy_from_slice(&fp_to_bytes(&self.c));
        out[96..128].copy_from_slice(&fp_to_bytes(&self.smu));
        out[128..160].copy_from_slice(&fp_to_bytes(&self.snu));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadNrProof);
        }
        let t = read_g1(&bytes[..64]).map_err(|_| EpidError::BadNrProof)?;
        let c = read_fp(&bytes[64..96]).map_err(|_| EpidError::BadNrProof)?;
        let smu = read_fp(&bytes[96..128]).map_err(|_| EpidError::BadNrProof)?;
        let snu = read_fp(&bytes[128..160]).map_err(|_| EpidError::BadNrProof)?;
        Ok(Self { t, c, smu, snu })
    }
}

/// Complete signature: basic signature, the SigRL version it was produced
/// against, and one non-revoked proof per SigRL entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpidSignature {
    pub sigma0: BasicSignature,
    pub rl_ver: u32,
    pub proofs: Vec<NrProof>,
}

impl EpidSignature {
    /// Signature size for a revocation list with `n2` entries: the basic
    /// signature, the 8-byte `(rl_ver, n2)` header, and one proof per entry.
    pub fn size_for(n2: usize) -> usize {
        BasicSignature::SIZE + 8 + n2 * NrProof::SIZE
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::size_for(self.proofs.len()));
        out.extend_from_slice(&self.sigma0.to_bytes());
        let mut header = [0u8; 8];
        write_u32(self.rl_ver, &mut header[..4]);
        write_u32(self.proofs.len() as u32, &mut header[4..]);
        out.extend_from_slice(&header);
        for proof in &self.proofs {
            out.extend_from_slice(&proof.to_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::size_for(0) {
            return Err(EpidError::BadSignature);
        }
        let sigma0 = BasicSignature::from_bytes(&bytes[..BasicSignature::SIZE])?;
        let rl_ver = read_u32(&bytes[BasicSignature::SIZE..]);
        let n2 = read_u32(&bytes[BasicSignature::SIZE + 4..]) as usize;
        if bytes.len() != Self::size_for(n2) {
            return Err(EpidError::BadSignature);
        }
        let mut proofs = Vec::with_capacity(n2);
        let mut offset = Self::size_for(0);
        for _ in 0..n2 {
            proofs.push(NrProof::from_bytes(&bytes[offset..offset + NrProof::SIZE])?);
            offset += NrProof::SIZE;
        }
        Ok(Self {
            sigma0,
            rl_ver,
            proofs,
        })
    }
}

/// One signature-revocation-list entry `(B_i, K_i)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigRlEntry {
    pub b: G1Affine,
    pub k: G1Affine,
}

impl SigRlEntry {
    pub const SIZE: usize = 2 * G1_SIZE;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..64].copy_from_slice(&g1_to_bytes(&self.b));
        out[64..].copy_from_slice(&g1_to_bytes(&self.k));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(EpidError::BadSigRlEntry);
        }
        let b = read_g1(&bytes[..64]).map_err(|_| EpidError::BadSigRlEntry)?;
        let k = read_g1(&bytes[64..]).map_err(|_| EpidError::BadSigRlEntry)?;
        if b.is_zero() || k.is_zero() {
            return Err(EpidError::BadSigRlEntry);
        }
        Ok(Self { b, k })
    }
}

/// Signature-based revocation list. The member borrows it; the issuer owns
/// and versions it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigRl {
    pub gid: GroupId,
    pub version: u32,
    pub entries: Vec<SigRlEntry>,
}

impl SigRl {
    pub const HEADER_SIZE: usize = GID_SIZE + 8;

    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.entries.len() * SigRlEntry::SIZE
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(&self.gid.0);
        let mut header = [0u8; 8];
        write_u32(self.version, &mut header[..4]);
        write_u32(self.entries.len() as u32, &mut header[4..]);
        out.extend_from_slice(&header);
        for entry in &self.entries {
            out.extend_from_slice(&entry.to_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(EpidError::BadSigRl);
        }
        let gid = GroupId::read(bytes);
        let version = read_u32(&bytes[GID_SIZE..]);
        let n2 = read_u32(&bytes[GID_SIZE + 4..]) as usize;
        if bytes.len() != Self::HEADER_SIZE + n2 * SigRlEntry::SIZE {
            return Err(EpidError::BadSigRl);
        }
        let mut entries = Vec::with_capacity(n2);
        let mut offset = Self::HEADER_SIZE;
        for _ in 0..n2 {
            entries.push(
                SigRlEntry::from_bytes(&bytes[offset..offset + SigRlEntry::SIZE])
                    .map_err(|_| EpidError::BadSigRl)?,
            );
            offset += SigRlEntry::SIZE;
        }
        Ok(Self {
            gid,
            version,
            entries,
        })
    }
}
