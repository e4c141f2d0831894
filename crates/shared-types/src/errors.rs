//! # Error Taxonomy
//!
//! Every failure during transaction execution collapses into a
//! [`RuleViolation`]; the entry point surfaces it as a transaction rejection
//! and discards all staged writes. Rejection is deterministic: the same
//! transaction against the same state fails the same way on every node.

use thiserror::Error;

// =============================================================================
// STATE ERRORS
// =============================================================================

/// Failures at the ledger-storage boundary.
#[derive(Debug, Error)]
pub enum StateError {
    /// Stored bytes did not decode as the expected entity shape.
    #[error("corrupt state entry at {address}: {source}")]
    CorruptEntry {
        /// Ledger address of the undecodable entry.
        address: String,
        #[source]
        source: serde_json::Error,
    },

    /// An entity failed to serialize for storage.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An address outside the registered namespace was touched.
    #[error("address {0} is outside the registered namespace")]
    AddressOutOfNamespace(String),
}

// =============================================================================
// RULE VIOLATIONS
// =============================================================================

/// A domain rule the transaction broke. Any variant rejects the transaction.
#[derive(Debug, Error)]
pub enum RuleViolation {
    /// The payload was missing, undecodable or carried a bad field.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A referenced entity does not exist or is soft-deleted.
    #[error("{kind} not found: {identifier}")]
    NotFound {
        /// Entity category, e.g. "account" or "asset".
        kind: &'static str,
        /// Identifier that failed to resolve.
        identifier: String,
    },

    /// The signer is not permitted to perform this operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A status machine was asked to move backwards or sideways.
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// A structural invariant would be broken by this transaction.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// An entity with the same identifier already exists.
    #[error("duplicate {kind}: {identifier}")]
    DuplicateEntity {
        /// Entity category, e.g. "account" or "asset".
        kind: &'static str,
        /// Identifier that collided.
        identifier: String,
    },

    /// Storage-level failure.
    #[error(transparent)]
    State(#[from] StateError),
}

impl RuleViolation {
    /// Shorthand for a missing account.
    #[must_use]
    pub fn account_not_found(public_key: &str) -> Self {
        Self::NotFound {
            kind: "account",
            identifier: public_key.to_string(),
        }
    }

    /// Shorthand for a missing asset.
    #[must_use]
    pub fn asset_not_found(uid: &str) -> Self {
        Self::NotFound {
            kind: "asset",
            identifier: uid.to_string(),
        }
    }

    /// Shorthand for a missing payload field.
    #[must_use]
    pub fn missing_field(name: &str) -> Self {
        Self::MalformedPayload(format!("missing required field '{name}'"))
    }
}
