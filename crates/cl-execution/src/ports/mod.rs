//! # Ports
//!
//! The storage seam of the engine. Handlers never see a concrete store, only
//! these traits; the host supplies whatever backs them. Execution is
//! synchronous by design, so the traits are too.

use shared_types::errors::StateError;

/// Read access to ledger state.
pub trait StateReader {
    /// Returns the bytes stored at `address`, if any.
    fn get(&self, address: &str) -> Result<Option<Vec<u8>>, StateError>;
}

/// Write access to ledger state.
pub trait StateWriter {
    /// Stores `value` at `address`, replacing any previous value.
    fn set(&mut self, address: &str, value: Vec<u8>) -> Result<(), StateError>;

    /// Removes the entry at `address`. Removing a missing entry is a no-op.
    fn delete(&mut self, address: &str) -> Result<(), StateError>;
}

/// Combined read/write state, the shape handlers receive.
pub trait LedgerState: StateReader + StateWriter {}

impl<T: StateReader + StateWriter> LedgerState for T {}
