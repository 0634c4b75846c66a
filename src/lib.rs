//! Member side of the EPID 2.0 group-signature scheme.
//!
//! A member, holding a per-member private key issued by a group authority,
//! signs messages so that a verifier with only the group public key can
//! confirm group membership without learning which member signed. Signatures
//! may be linked under a caller-chosen basename; under random basenames they
//! stay unlinkable. The member proves non-revocation against a
//! signature-based revocation list as part of every signature.

pub mod basename;
pub mod codec;
pub mod custodian;
pub mod error;
pub mod math;
pub mod member;
pub mod transcript;
pub mod types;

pub use error::{EpidError, Result, SigStatus};
pub use math::hash::HashAlg;
pub use math::rand::{BitSupplier, BitSupplierFailure, RngSupplier};
pub use member::storage::{MemoryNv, NvStorage};
pub use member::{MemberContext, MemberParams};
pub use types::{
    BasicSignature, CompressedPrivKey, EpidSignature, GroupId, GroupPubKey, IssuerNonce,
    JoinRequest, MemberPrecomp, MembershipCredential, NrProof, PrivKey, SigRl, SigRlEntry,
};
