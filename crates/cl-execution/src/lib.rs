//! # CraftLedger Execution Engine
//!
//! Deterministic, event-driven transaction execution for the CraftLedger
//! provenance ledger.
//!
//! ## Purpose
//!
//! Turns signed transactions into ledger state transitions. Each transaction
//! declares one primary event; the dispatch engine derives any secondary
//! events from the payload and runs the registered handler chains in
//! priority order. All writes are staged and committed atomically, so a
//! rejection at any point in any chain leaves state untouched.
//!
//! ## Determinism
//!
//! Given identical prior state and an identical transaction, every node
//! produces identical writes:
//!
//! - no wall clock: timestamps come only from the payload
//! - no randomness: identifiers come only from the payload and the signature
//! - ordered iteration: every serialized map is a `BTreeMap`, handler chains
//!   are sorted by declared priority with manifest order breaking ties
//!
//! ## Layout
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Addressing | `domain/addressing.rs` | Deterministic 70-hex state addresses |
//! | Event context | `domain/context.rs` | Per-transaction view and scratch space |
//! | Ports | `ports/` | `StateReader` / `StateWriter` seams |
//! | Adapters | `adapters/` | In-memory ledger, staged write overlay |
//! | Dispatch | `dispatch/` | Listener registry, derivation, chain execution |
//! | Handlers | `handlers/` | The full creator / updater / validator set |
//! | Service | `service.rs` | Transaction entry point and receipts |
//!
//! ## Usage Example
//!
//! ```ignore
//! use cl_execution::prelude::*;
//!
//! let handler = CraftLedgerHandler::new();
//! let mut ledger = InMemoryLedger::new();
//! let receipt = handler.apply(&transaction, &mut ledger)?;
//! println!("wrote {} addresses", receipt.write_set.len());
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::addressing::{
        account_address, asset_address, bootstrap_address, email_index_address,
        kind_index_address, namespace, owner_index_address,
    };
    pub use crate::domain::context::EventContext;

    // Ports
    pub use crate::ports::{LedgerState, StateReader, StateWriter};

    // Adapters
    pub use crate::adapters::{InMemoryLedger, StagedState};

    // Dispatch
    pub use crate::dispatch::{derive_sub_events, Listener, Registry, Subscription, Trigger};

    // Handlers
    pub use crate::handlers::default_manifest;

    // Errors
    pub use crate::errors::ApplyError;

    // Service
    pub use crate::service::{CraftLedgerHandler, RegistrationMetadata, TxReceipt};

    // Shared domain model
    pub use shared_types::prelude::*;
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Transaction family name, hashed into the state namespace.
pub const FAMILY_NAME: &str = "craftledger";

/// Transaction family version.
pub const FAMILY_VERSION: &str = "1.0";

// =============================================================================
// TESTS
// =============================================================================
