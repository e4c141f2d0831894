//! In-memory ledger backed by a `BTreeMap`, the reference state backend.

use crate::ports::{StateReader, StateWriter};
use shared_types::errors::StateError;
use std::collections::BTreeMap;

/// A ledger held entirely in memory. Iteration order is address order, so
/// dumps and comparisons are deterministic.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    entries: BTreeMap<String, Vec<u8>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All stored entries in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.entries.iter()
    }
}

impl StateReader for InMemoryLedger {
    fn get(&self, address: &str) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.entries.get(address).cloned())
    }
}

impl StateWriter for InMemoryLedger {
    fn set(&mut self, address: &str, value: Vec<u8>) -> Result<(), StateError> {
        self.entries.insert(address.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, address: &str) -> Result<(), StateError> {
        self.entries.remove(address);
        Ok(())
    }
}
