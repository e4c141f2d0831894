//! # Execution Errors
//!
//! The outer error surface of the engine. Domain failures arrive as
//! [`RuleViolation`](shared_types::errors::RuleViolation) and are wrapped
//! into an [`ApplyError`], which the host maps to a transaction rejection.

use shared_types::errors::RuleViolation;
use thiserror::Error;

/// Why a transaction was not applied.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The transaction broke a domain rule. All staged writes were discarded.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] RuleViolation),

    /// No handler chain is registered for the declared event.
    #[error("no handler registered for event '{0}'")]
    UnhandledEvent(String),
}
