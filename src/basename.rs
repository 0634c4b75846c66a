//! Allow-list of basenames a member will sign under.
//!
//! Name-based signatures create a pseudonymous identifier per basename, so
//! the member only signs under basenames that were explicitly registered.

use std::collections::HashSet;

use crate::error::{EpidError, Result};

const LOG_TARGET: &str = "epid_member::basename";

/// Registered basenames, bounded by a configurable cap.
#[derive(Debug)]
pub struct AllowedBasenames {
    names: HashSet<Vec<u8>>,
    max_entries: usize,
}

impl AllowedBasenames {
    pub fn new(max_entries: usize) -> Self {
        Self {
            names: HashSet::new(),
            max_entries,
        }
    }

    /// Registers a basename. Empty basenames and cap overruns are rejected;
    /// re-registering an existing basename reports [`EpidError::Duplicate`].
    pub fn register(&mut self, basename: &[u8]) -> Result<()> {
        if basename.is_empty() {
            return Err(EpidError::BadBasename);
        }
        if self.names.contains(basename) {
            return Err(EpidError::Duplicate);
        }
        if self.names.len() >= self.max_entries {
            tracing::warn!(
                target: LOG_TARGET,
                cap = self.max_entries,
                "basename registry full"
            );
            return Err(EpidError::BadBasename);
        }
        self.names.insert(basename.to_vec());
        Ok(())
    }

    pub fn contains(&self, basename: &[u8]) -> bool {
        self.names.contains(basename)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
