//! # Service Layer
//!
//! The transaction entry point: registration metadata for the host, and
//! [`CraftLedgerHandler::apply`], which stages a dispatch and commits it
//! atomically.

use crate::adapters::StagedState;
use crate::dispatch::{Registry, Trigger};
use crate::domain::addressing::namespace;
use crate::domain::context::EventContext;
use crate::errors::ApplyError;
use crate::handlers::default_manifest;
use crate::ports::{StateReader, StateWriter};
use crate::{FAMILY_NAME, FAMILY_VERSION};
use shared_types::errors::RuleViolation;
use shared_types::payload::Transaction;
use std::collections::BTreeSet;
use tracing::{info, warn};

// =============================================================================
// METADATA
// =============================================================================

/// What the host registers with its validator network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationMetadata {
    /// Transaction family name.
    pub family_name: &'static str,
    /// Transaction family version.
    pub family_version: &'static str,
    /// State namespaces this handler claims.
    pub namespaces: Vec<String>,
}

/// The outcome of a successfully applied transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Wire string of the primary event.
    pub event: String,
    /// Every address read during execution, in address order.
    pub read_set: BTreeSet<String>,
    /// Every address written or deleted, in address order.
    pub write_set: BTreeSet<String>,
}

// =============================================================================
// HANDLER
// =============================================================================

/// The execution engine behind the transaction entry point.
pub struct CraftLedgerHandler {
    registry: Registry,
}

impl Default for CraftLedgerHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CraftLedgerHandler {
    /// Builds the handler with the canonical listener manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::with_manifest(default_manifest())
    }

    /// Builds the handler with a custom manifest. Manifest order is the
    /// tie-break for equal priorities.
    #[must_use]
    pub fn with_manifest(manifest: Vec<Box<dyn crate::dispatch::Listener>>) -> Self {
        Self {
            registry: Registry::from_manifest(manifest),
        }
    }

    /// Registration metadata for the host.
    #[must_use]
    pub fn metadata(&self) -> RegistrationMetadata {
        RegistrationMetadata {
            family_name: FAMILY_NAME,
            family_version: FAMILY_VERSION,
            namespaces: vec![namespace().to_string()],
        }
    }

    /// Applies one transaction.
    ///
    /// Execution runs against a staged overlay; only a fully successful
    /// dispatch reaches the backing state. The receipt reports the exact
    /// read and write sets, so replays can be compared address for address.
    pub fn apply<S: StateReader + StateWriter>(
        &self,
        tx: &Transaction,
        state: &mut S,
    ) -> Result<TxReceipt, ApplyError> {
        let mut ctx = EventContext::from_transaction(tx)?;
        let event = ctx.event();
        if !self.registry.handles(Trigger::Event(event)) {
            return Err(ApplyError::UnhandledEvent(event.as_str().to_string()));
        }

        let mut staged = StagedState::new(&*state);
        if let Err(violation) = self.registry.dispatch(&mut ctx, &mut staged) {
            warn!(event = %event, error = %violation, "transaction rejected");
            return Err(ApplyError::InvalidTransaction(violation));
        }

        let (read_set, writes) = staged.into_parts();
        let write_set: BTreeSet<String> = writes.keys().cloned().collect();
        for (address, staged_value) in writes {
            let result = match staged_value {
                Some(value) => state.set(&address, value),
                None => state.delete(&address),
            };
            result.map_err(|e| ApplyError::InvalidTransaction(RuleViolation::State(e)))?;
        }
        info!(
            event = %event,
            reads = read_set.len(),
            writes = write_set.len(),
            "transaction applied"
        );
        Ok(TxReceipt {
            event: event.as_str().to_string(),
            read_set,
            write_set,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
