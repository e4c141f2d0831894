//! # Transaction Payload
//!
//! The decoded payload envelope carried by every transaction: a declared
//! event kind, a client-declared timestamp, and a free-form field map the
//! handlers validate per event.

use crate::enums::EventKind;
use serde::{Deserialize, Serialize};

/// The JSON payload of a submitted transaction.
///
/// `fields` stays untyped here; each handler extracts and validates exactly
/// the fields its event requires, and forbidden-field checks run against the
/// raw map before any entity is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Declared event kind. An unknown wire string fails decoding.
    pub event: EventKind,
    /// Client-declared timestamp. The engine never reads a wall clock.
    pub timestamp: String,
    /// Event-specific fields.
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl TransactionPayload {
    /// Decodes a payload from raw transaction bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// A transaction as delivered to the execution engine. Signature verification
/// happens upstream; the engine treats `signer_public_key` as authenticated.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    /// Raw payload bytes, decoded via [`TransactionPayload::from_bytes`].
    pub payload: Vec<u8>,
    /// Authenticated public key of the signer.
    pub signer_public_key: String,
    /// Transaction signature, used as a unique transaction identifier.
    pub signature: String,
}

impl Transaction {
    /// Builds a transaction from its parts.
    #[must_use]
    pub fn new(payload: Vec<u8>, signer_public_key: &str, signature: &str) -> Self {
        Self {
            payload,
            signer_public_key: signer_public_key.to_string(),
            signature: signature.to_string(),
        }
    }
}
