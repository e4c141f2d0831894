//! # Event Context
//!
//! The per-transaction view handed to every handler in every chain: the
//! decoded payload, the authenticated signer, the transaction signature and
//! a scratch space handlers use to pass facts down the chain.
//!
//! Scratch entries are the only channel between handlers. A creator notes
//! what it created; index and history updaters later in the chain read those
//! notes instead of re-deriving them from the payload.

use serde_json::Value;
use shared_types::enums::EventKind;
use shared_types::errors::RuleViolation;
use shared_types::payload::{Transaction, TransactionPayload};
use std::collections::BTreeMap;

/// Scratch key: uids and public keys of entities mutated so far.
pub const SCRATCH_TARGETS: &str = "targets";

/// Scratch key: `[uid, kind]` pairs of assets created so far.
pub const SCRATCH_CREATED_ASSETS: &str = "created_assets";

/// Scratch key: `[uid, kind, from, to]` tuples of assets transferred.
pub const SCRATCH_TRANSFERRED_ASSETS: &str = "transferred_assets";

/// Everything a handler may observe about the transaction being executed.
pub struct EventContext {
    payload: TransactionPayload,
    signer_public_key: String,
    signature: String,
    scratch: BTreeMap<String, Value>,
}

impl EventContext {
    /// Decodes the transaction payload and builds the context.
    pub fn from_transaction(tx: &Transaction) -> Result<Self, RuleViolation> {
        let payload = TransactionPayload::from_bytes(&tx.payload)
            .map_err(|e| RuleViolation::MalformedPayload(e.to_string()))?;
        Ok(Self {
            payload,
            signer_public_key: tx.signer_public_key.clone(),
            signature: tx.signature.clone(),
            scratch: BTreeMap::new(),
        })
    }

    /// The primary event declared by the payload.
    #[must_use]
    pub fn event(&self) -> EventKind {
        self.payload.event
    }

    /// The client-declared timestamp. Never a wall clock.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.payload.timestamp
    }

    /// Authenticated public key of the signer.
    #[must_use]
    pub fn signer(&self) -> &str {
        &self.signer_public_key
    }

    /// Transaction signature, used as the transaction identifier.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The raw event-specific field map.
    #[must_use]
    pub fn fields(&self) -> &serde_json::Map<String, Value> {
        &self.payload.fields
    }

    // =========================================================================
    // FIELD EXTRACTION
    // =========================================================================

    /// A required string field.
    pub fn require_str(&self, name: &str) -> Result<&str, RuleViolation> {
        self.opt_str(name)?
            .ok_or_else(|| RuleViolation::missing_field(name))
    }

    /// An optional string field. Present but non-string is malformed.
    pub fn opt_str(&self, name: &str) -> Result<Option<&str>, RuleViolation> {
        match self.payload.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(RuleViolation::MalformedPayload(format!(
                "field '{name}' must be a string"
            ))),
        }
    }

    /// A required numeric field.
    pub fn require_f64(&self, name: &str) -> Result<f64, RuleViolation> {
        self.payload
            .fields
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                RuleViolation::MalformedPayload(format!("field '{name}' must be a number"))
            })
    }

    /// A required unsigned integer field.
    pub fn require_u64(&self, name: &str) -> Result<u64, RuleViolation> {
        self.payload
            .fields
            .get(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                RuleViolation::MalformedPayload(format!(
                    "field '{name}' must be a non-negative integer"
                ))
            })
    }

    /// A required list-of-strings field.
    pub fn require_str_list(&self, name: &str) -> Result<Vec<String>, RuleViolation> {
        let items = self
            .payload
            .fields
            .get(name)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                RuleViolation::MalformedPayload(format!("field '{name}' must be a list"))
            })?;
        items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    RuleViolation::MalformedPayload(format!(
                        "field '{name}' must contain only strings"
                    ))
                })
            })
            .collect()
    }

    /// A required object field.
    pub fn require_object(
        &self,
        name: &str,
    ) -> Result<&serde_json::Map<String, Value>, RuleViolation> {
        self.payload
            .fields
            .get(name)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                RuleViolation::MalformedPayload(format!("field '{name}' must be an object"))
            })
    }

    // =========================================================================
    // SCRATCH SPACE
    // =========================================================================

    /// Stores a fact for handlers later in the chain.
    pub fn add_data(&mut self, key: &str, value: Value) {
        self.scratch.insert(key.to_string(), value);
    }

    /// Reads a fact stored earlier in the chain.
    #[must_use]
    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.scratch.get(key)
    }

    /// Appends a value to a list-valued scratch entry, creating it on first
    /// use.
    pub fn push_data(&mut self, key: &str, value: Value) {
        match self.scratch.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            _ => {
                self.scratch.insert(key.to_string(), Value::Array(vec![value]));
            }
        }
    }

    /// Records an entity identifier as mutated by this transaction.
    pub fn note_target(&mut self, identifier: &str) {
        self.push_data(SCRATCH_TARGETS, Value::String(identifier.to_string()));
    }

    /// All entity identifiers recorded so far, in note order, deduplicated.
    #[must_use]
    pub fn targets(&self) -> Vec<String> {
        let mut seen = Vec::new();
        if let Some(Value::Array(items)) = self.scratch.get(SCRATCH_TARGETS) {
            for item in items {
                if let Some(s) = item.as_str() {
                    if !seen.iter().any(|t: &String| t == s) {
                        seen.push(s.to_string());
                    }
                }
            }
        }
        seen
    }
}

// =============================================================================
// TESTS
// =============================================================================
