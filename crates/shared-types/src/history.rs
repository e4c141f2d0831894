//! # History Entries
//!
//! Append-only provenance log carried by every entity. Entries are never
//! rewritten or removed, including across soft deletion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recorded edit: the value before and after.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditDelta {
    /// Value before the edit.
    pub old: serde_json::Value,
    /// Value after the edit.
    pub new: serde_json::Value,
}

/// A single entry in an entity's history log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Name of the handler that recorded this entry.
    pub source: String,
    /// Wire string of the (sub-)event kind being processed.
    pub event: String,
    /// Public key of the signer that triggered the event.
    pub actor: String,
    /// Identifiers of the entities affected by the event.
    pub targets: Vec<String>,
    /// Signature of the originating transaction.
    pub transaction: String,
    /// Timestamp declared by the transaction payload.
    pub timestamp: String,
    /// Field-level deltas, present only for edit events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edits: Option<BTreeMap<String, EditDelta>>,
}

impl HistoryEntry {
    /// Creates an entry without edit deltas.
    #[must_use]
    pub fn new(
        source: &str,
        event: &str,
        actor: &str,
        targets: Vec<String>,
        transaction: &str,
        timestamp: &str,
    ) -> Self {
        Self {
            source: source.to_string(),
            event: event.to_string(),
            actor: actor.to_string(),
            targets,
            transaction: transaction.to_string(),
            timestamp: timestamp.to_string(),
            edits: None,
        }
    }

    /// Attaches field-level deltas to this entry.
    #[must_use]
    pub fn with_edits(mut self, edits: BTreeMap<String, EditDelta>) -> Self {
        self.edits = Some(edits);
        self
    }
}
