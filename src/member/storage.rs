//! Non-volatile credential storage.
//!
//! A single slot, identified by a fixed index, holds the serialized
//! `GroupPubKey ‖ MembershipCredential` pair across restarts. The back-end
//! is an external collaborator; [`MemoryNv`] keeps everything in process.

use std::collections::HashMap;

use crate::error::{EpidError, Result};
use crate::types::{GroupPubKey, MembershipCredential};

const LOG_TARGET: &str = "epid_member::member::storage";

/// NV index of the membership-credential slot.
pub const MEMBERSHIP_CREDENTIAL_NV_INDEX: u32 = 0x01c1_0120;

/// Keyed byte-slot storage with `define / undefine / read / write`
/// semantics. Writing requires a defined slot; write-after-write at the same
/// index is allowed.
pub trait NvStorage {
    fn define(&mut self, index: u32, size: usize) -> Result<()>;
    fn undefine(&mut self, index: u32) -> Result<()>;
    fn read(&self, index: u32) -> Option<Vec<u8>>;
    fn write(&mut self, index: u32, data: &[u8]) -> Result<()>;
}

/// In-process NV back-end.
#[derive(Debug, Default)]
pub struct MemoryNv {
    slots: HashMap<u32, Vec<u8>>,
}

impl MemoryNv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NvStorage for MemoryNv {
    fn define(&mut self, index: u32, size: usize) -> Result<()> {
        self.slots.entry(index).or_insert_with(|| vec![0u8; size]);
        Ok(())
    }

    fn undefine(&mut self, index: u32) -> Result<()> {
        self.slots.remove(&index);
        Ok(())
    }

    fn read(&self, index: u32) -> Option<Vec<u8>> {
        self.slots.get(&index).cloned()
    }

    fn write(&mut self, index: u32, data: &[u8]) -> Result<()> {
        match self.slots.get_mut(&index) {
            Some(slot) => {
                slot.clear();
                slot.extend_from_slice(data);
                Ok(())
            }
            None => Err(EpidError::BadArg),
        }
    }
}

const SLOT_SIZE: usize = GroupPubKey::SIZE + MembershipCredential::SIZE;

/// Persists the active key material, defining the slot on first use.
pub(crate) fn write_membership_credential(
    nv: &mut dyn NvStorage,
    pub_key: &GroupPubKey,
    credential: &MembershipCredential,
) -> Result<()> {
    if nv.read(MEMBERSHIP_CREDENTIAL_NV_INDEX).is_none() {
        nv.define(MEMBERSHIP_CREDENTIAL_NV_INDEX, SLOT_SIZE)?;
    }
    let mut blob = Vec::with_capacity(SLOT_SIZE);
    blob.extend_from_slice(&pub_key.to_bytes());
    blob.extend_from_slice(&credential.to_bytes());
    let written = nv.write(MEMBERSHIP_CREDENTIAL_NV_INDEX, &blob);
    if written.is_err() {
        // Leave no half-written slot behind.
        let _ = nv.undefine(MEMBERSHIP_CREDENTIAL_NV_INDEX);
    }
    tracing::debug!(target: LOG_TARGET, "membership credential persisted");
    written
}

/// Loads the persisted pair, or `None` when the slot is undefined. A defined
/// slot with malformed content is an error.
pub(crate) fn read_membership_credential(
    nv: &dyn NvStorage,
) -> Result<Option<(GroupPubKey, MembershipCredential)>> {
    let blob = match nv.read(MEMBERSHIP_CREDENTIAL_NV_INDEX) {
        Some(blob) => blob,
        None => return Ok(None),
    };
    if blob.len() != SLOT_SIZE || blob.iter().all(|b| *b == 0) {
        // Defined but never written.
        return Ok(None);
    }
    let pub_key = GroupPubKey::from_bytes(&blob[..GroupPubKey::SIZE])?;
    let credential = MembershipCredential::from_bytes(&blob[GroupPubKey::SIZE..])?;
    Ok(Some((pub_key, credential)))
}

pub(crate) fn clear_membership_credential(nv: &mut dyn NvStorage) -> Result<()> {
    nv.undefine(MEMBERSHIP_CREDENTIAL_NV_INDEX)
}
