//! Status reporting for member operations.
//!
//! The legacy wire protocol talks in integer status codes: zero for plain
//! success, small positive values for "success with status" outcomes of
//! sign/verify, and negative values for failures. Both enums below preserve
//! those integers exactly, and the code/string mappings are bijective.

use thiserror::Error;

/// Successful sub-outcomes of signature production and verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SigStatus {
    /// Signature is valid.
    Valid = 0,
    /// Signature is invalid.
    Invalid = 1,
    /// Signature revoked in GroupRl.
    RevokedInGroupRl = 2,
    /// Signature revoked in PrivRl.
    RevokedInPrivRl = 3,
    /// Signature revoked in SigRl.
    RevokedInSigRl = 4,
    /// Signature revoked in VerifierRl.
    RevokedInVerifierRl = 5,
}

impl SigStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Valid),
            1 => Some(Self::Invalid),
            2 => Some(Self::RevokedInGroupRl),
            3 => Some(Self::RevokedInPrivRl),
            4 => Some(Self::RevokedInSigRl),
            5 => Some(Self::RevokedInVerifierRl),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "signature is valid",
            Self::Invalid => "invalid signature",
            Self::RevokedInGroupRl => "signature revoked in GroupRl",
            Self::RevokedInPrivRl => "signature revoked in PrivRl",
            Self::RevokedInSigRl => "signature revoked in SigRl",
            Self::RevokedInVerifierRl => "signature revoked in VerifierRl",
        }
    }
}

/// Failure statuses.
///
/// Declaration order (and therefore the explicit discriminants) matches the
/// legacy table starting at -999; the `Bad*` argument subvariants form a
/// contiguous range so callers can collapse them into one category without
/// losing the wire value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum EpidError {
    #[error("unspecified error")]
    Unspecified = -999,

    #[error("not implemented")]
    NotImpl = -998,

    #[error("insufficient memory provided")]
    NoMem = -997,

    #[error("could not allocate memory")]
    MemAlloc = -996,

    #[error("internal math error")]
    Math = -995,

    #[error("attempt to divide by zero")]
    DivByZero = -994,

    #[error("underflow")]
    Underflow = -993,

    #[error("unsupported hash algorithm type")]
    HashAlgorithmNotSupported = -992,

    #[error("reached max iteration for random number generation")]
    RandMaxIter = -991,

    #[error("argument would add duplicate entry")]
    Duplicate = -990,

    #[error("the set basename is inconsistent with supplied parameters")]
    InconsistentBasenameSet = -989,

    #[error("quadratic non-residue")]
    QuadraticNonResidue = -988,

    #[error("operation out of sequence")]
    OutOfSequence = -987,

    #[error("invalid join request")]
    BadJoinRequest = -986,

    #[error("format is not supported")]
    SchemaNotSupported = -985,

    #[error("operation not supported")]
    OperationNotSupported = -984,

    #[error("private key not in group")]
    KeyNotInGroup = -983,

    #[error("input Precomp not in group")]
    PrecompNotInGroup = -982,

    #[error("version mismatch error")]
    VersionMismatch = -981,

    #[error("group id miss match")]
    GroupIdMismatch = -980,

    #[error("version already at maximum")]
    MaxVersion = -979,

    #[error("entries already at maximum")]
    MaxEntries = -978,

    #[error("request for random bits failed")]
    BitSupplier = -977,

    #[error("invalid context to function")]
    BadCtx = -976,

    #[error("invalid GroupPubKey to function")]
    BadGroupPubKey = -975,

    #[error("invalid Signature to function")]
    BadSignature = -974,

    #[error("invalid NrProof to function")]
    BadNrProof = -973,

    #[error("invalid PrivRl to function")]
    BadPrivRl = -972,

    #[error("invalid SigRl to function")]
    BadSigRl = -971,

    #[error("invalid SigRlEntry to function")]
    BadSigRlEntry = -970,

    #[error("invalid GroupRl to function")]
    BadGroupRl = -969,

    #[error("invalid VerifierRl to function")]
    BadVerifierRl = -968,

    #[error("invalid Precomp to function")]
    BadPrecomp = -967,

    #[error("invalid Basename to function")]
    BadBasename = -966,

    #[error("invalid Message to function")]
    BadMessage = -965,

    #[error("invalid RlEntry to function")]
    BadRlEntry = -964,

    #[error("invalid issuing private key to function")]
    BadIPrivKey = -963,

    #[error("invalid GroupId to function")]
    BadGid = -962,

    #[error("invalid private key to function")]
    BadPrivKey = -961,

    #[error("invalid nonce to function")]
    BadNonce = -960,

    #[error("invalid membership credential")]
    BadMembershipCredential = -959,

    #[error("invalid rekey seed to function")]
    BadRekeySeed = -958,

    #[error("unrelated key pair")]
    UnrelatedKeyPair = -957,

    #[error("invalid configuration parameters to function")]
    BadConfig = -956,

    #[error("basename not registered")]
    BasenameNotRegistered = -955,

    #[error("bad arguments")]
    BadArg = -954,
}

impl EpidError {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Inverse of [`code`](Self::code). Unknown codes return `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        ALL.iter().copied().find(|e| e.code() == code)
    }

    /// True for the `Bad*` argument-class statuses, which callers may treat
    /// as one category.
    pub fn is_bad_argument(self) -> bool {
        (Self::BadCtx.code()..=Self::BadArg.code()).contains(&self.code())
    }
}

const ALL: [EpidError; 46] = [
    EpidError::Unspecified,
    EpidError::NotImpl,
    EpidError::NoMem,
    EpidError::MemAlloc,
    EpidError::Math,
    EpidError::DivByZero,
    EpidError::Underflow,
    EpidError::HashAlgorithmNotSupported,
    EpidError::RandMaxIter,
    EpidError::Duplicate,
    EpidError::InconsistentBasenameSet,
    EpidError::QuadraticNonResidue,
    EpidError::OutOfSequence,
    EpidError::BadJoinRequest,
    EpidError::SchemaNotSupported,
    EpidError::OperationNotSupported,
    EpidError::KeyNotInGroup,
    EpidError::PrecompNotInGroup,
    EpidError::VersionMismatch,
    EpidError::GroupIdMismatch,
    EpidError::MaxVersion,
    EpidError::MaxEntries,
    EpidError::BitSupplier,
    EpidError::BadCtx,
    EpidError::BadGroupPubKey,
    EpidError::BadSignature,
    EpidError::BadNrProof,
    EpidError::BadPrivRl,
    EpidError::BadSigRl,
    EpidError::BadSigRlEntry,
    EpidError::BadGroupRl,
    EpidError::BadVerifierRl,
    EpidError::BadPrecomp,
    EpidError::BadBasename,
    EpidError::BadMessage,
    EpidError::BadRlEntry,
    EpidError::BadIPrivKey,
    EpidError::BadGid,
    EpidError::BadPrivKey,
    EpidError::BadNonce,
    EpidError::BadMembershipCredential,
    EpidError::BadRekeySeed,
    EpidError::UnrelatedKeyPair,
    EpidError::BadConfig,
    EpidError::BasenameNotRegistered,
    EpidError::BadArg,
];

pub type Result<T> = std::result::Result<T, EpidError>;
