//! # CraftLedger Test Suite
//!
//! End-to-end scenarios driven through the public transaction entry point.
//!
//! ## Structure
//!
//! ```text
//! tests/src/integration/
//! ├── fixtures.rs      # Shared harness: ledger, signers, payload builders
//! ├── accounts.rs      # Registration, uniqueness, admin minting
//! ├── assets.rs        # Creation matrix, edits, deletion, authentication
//! ├── workflow.rs      # Work orders, batches, sub-assignments, materials
//! ├── transfer.rs      # Ownership moves, logistics, packaging coupling
//! ├── admin.rs         # Certification, moderation, capability tiers
//! └── determinism.rs   # Replay identity and atomic rejection
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cl-tests
//! cargo test -p cl-tests integration::workflow::
//! ```

#![allow(dead_code)]

pub mod integration;
