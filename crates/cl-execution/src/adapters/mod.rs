//! # Adapters
//!
//! Concrete state backends: a plain in-memory ledger for hosting and tests,
//! and the staged overlay that gives every transaction atomic, all-or-nothing
//! semantics.

pub mod memory;
pub mod staged;

pub use memory::InMemoryLedger;
pub use staged::StagedState;
