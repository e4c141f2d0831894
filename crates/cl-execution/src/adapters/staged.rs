//! Staged write overlay.
//!
//! Every transaction executes against a `StagedState` layered over the real
//! ledger. Reads fall through to the base and are recorded; writes land in
//! the overlay only. On success the overlay is drained into the base in one
//! pass; on rejection it is simply dropped, leaving the base untouched.

use crate::ports::{StateReader, StateWriter};
use shared_types::errors::StateError;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// A write overlay over a base reader, tracking read and write sets.
///
/// `None` in the overlay marks a staged deletion.
pub struct StagedState<'a, R: StateReader + ?Sized> {
    base: &'a R,
    writes: BTreeMap<String, Option<Vec<u8>>>,
    reads: RefCell<BTreeSet<String>>,
}

impl<'a, R: StateReader + ?Sized> StagedState<'a, R> {
    /// Creates an empty overlay over `base`.
    pub fn new(base: &'a R) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
            reads: RefCell::new(BTreeSet::new()),
        }
    }

    /// Addresses read so far, in address order.
    #[must_use]
    pub fn read_set(&self) -> BTreeSet<String> {
        self.reads.borrow().clone()
    }

    /// Addresses written or deleted so far, in address order.
    #[must_use]
    pub fn write_set(&self) -> BTreeSet<String> {
        self.writes.keys().cloned().collect()
    }

    /// Consumes the overlay, yielding the read set and the staged writes.
    #[must_use]
    pub fn into_parts(self) -> (BTreeSet<String>, BTreeMap<String, Option<Vec<u8>>>) {
        (self.reads.into_inner(), self.writes)
    }
}

impl<R: StateReader + ?Sized> StateReader for StagedState<'_, R> {
    fn get(&self, address: &str) -> Result<Option<Vec<u8>>, StateError> {
        self.reads.borrow_mut().insert(address.to_string());
        match self.writes.get(address) {
            Some(staged) => Ok(staged.clone()),
            None => self.base.get(address),
        }
    }
}

impl<R: StateReader + ?Sized> StateWriter for StagedState<'_, R> {
    fn set(&mut self, address: &str, value: Vec<u8>) -> Result<(), StateError> {
        self.writes.insert(address.to_string(), Some(value));
        Ok(())
    }

    fn delete(&mut self, address: &str) -> Result<(), StateError> {
        self.writes.insert(address.to_string(), None);
        Ok(())
    }
}
