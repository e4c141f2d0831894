//! # Handler Set
//!
//! Every listener in the execution engine, grouped by role:
//!
//! | Module | Contents |
//! |--------|----------|
//! | `creators` | bootstrap, account/admin/asset creation, product minting |
//! | `workflow` | work orders, sub-assignments, batches, raw-material usage |
//! | `transfer` | ownership transfer, packaging, unpacking |
//! | `admin` | edits, deletion, authentication, certification plumbing |
//! | `updaters` | ownership lists, indices, history, email uniqueness |
//! | `validators` | cross-entity rules, run late in each chain |
//!
//! Validators carry negative priorities on purpose: they fire after the
//! mutating handlers and inspect the staged result. A late rejection discards
//! every staged write, so the ordering is safe.
//!
//! [`default_manifest`] lists all listeners in their canonical order. That
//! order is the tie-break for equal priorities and must not be reshuffled.

use crate::domain::addressing::{account_address, asset_address};
use crate::dispatch::Listener;
use crate::ports::{LedgerState, StateReader, StateWriter};
use serde_json::Value;
use shared_types::accounts::Account;
use shared_types::assets::Asset;
use shared_types::errors::{RuleViolation, StateError};
use shared_types::history::EditDelta;
use std::collections::BTreeMap;

pub mod admin;
pub mod creators;
pub mod transfer;
pub mod updaters;
pub mod validators;
pub mod workflow;

// =============================================================================
// MANIFEST
// =============================================================================

/// The full listener manifest in canonical order.
#[must_use]
pub fn default_manifest() -> Vec<Box<dyn Listener>> {
    vec![
        // Creators
        Box::new(creators::Bootstrap),
        Box::new(creators::AccountCreation),
        Box::new(creators::AdminCreation),
        Box::new(creators::AssetCreation),
        Box::new(creators::CertificationIssuer),
        Box::new(creators::ProductsCreation),
        // Workflow
        Box::new(workflow::WorkOrderProgress),
        Box::new(workflow::AssigneeUpdater),
        Box::new(workflow::SubAssignmentProgress),
        Box::new(workflow::AddToBatch),
        Box::new(workflow::BatchUpdater),
        // Transfer
        Box::new(transfer::AssetsTransferrer),
        Box::new(transfer::PackageProducts),
        Box::new(transfer::UnpackProduct),
        // Admin
        Box::new(admin::EditEntity),
        Box::new(admin::DeleteEntity),
        Box::new(admin::AuthenticateEntity),
        Box::new(admin::ModeratorEdit),
        Box::new(admin::CertificateHolderUpdater),
        Box::new(admin::AdminActionsUpdater),
        // Updaters
        Box::new(updaters::OwnerHistoryUpdater),
        Box::new(updaters::AssetIndexUpdater),
        Box::new(updaters::EntityHistoryUpdater),
        Box::new(updaters::EmailIndexUpdater),
        // Validators
        Box::new(validators::ValidateCreatorAccount),
        Box::new(validators::ValidateAssigneeAccount),
        Box::new(validators::ValidateAcceptContext),
        Box::new(validators::ValidateSubAssignment),
        Box::new(validators::ValidateRawMaterialAddition),
        Box::new(validators::ValidateBatchCompletion),
        Box::new(validators::ValidateTransfer),
        Box::new(validators::ValidateAdminAccount),
    ]
}

// =============================================================================
// STATE HELPERS
// =============================================================================

fn decode_entry<T: serde::de::DeserializeOwned>(
    address: &str,
    bytes: &[u8],
) -> Result<T, RuleViolation> {
    serde_json::from_slice(bytes).map_err(|source| {
        RuleViolation::State(StateError::CorruptEntry {
            address: address.to_string(),
            source,
        })
    })
}

/// Loads the account at `public_key`, deleted or not.
pub fn load_account(
    state: &dyn LedgerState,
    public_key: &str,
) -> Result<Option<Account>, RuleViolation> {
    let address = account_address(public_key);
    match state.get(&address).map_err(RuleViolation::State)? {
        Some(bytes) => Ok(Some(decode_entry(&address, &bytes)?)),
        None => Ok(None),
    }
}

/// Loads the account at `public_key`, rejecting missing or deleted ones.
pub fn require_account(
    state: &dyn LedgerState,
    public_key: &str,
) -> Result<Account, RuleViolation> {
    match load_account(state, public_key)? {
        Some(account) if !account.base().is_deleted => Ok(account),
        _ => Err(RuleViolation::account_not_found(public_key)),
    }
}

/// Stores `account` at its canonical address.
pub fn store_account(state: &mut dyn LedgerState, account: &Account) -> Result<(), RuleViolation> {
    let bytes = serde_json::to_vec(account).map_err(StateError::Serialization)?;
    state
        .set(&account_address(account.public_key()), bytes)
        .map_err(RuleViolation::State)
}

/// Loads the asset at `uid`, deleted or not.
pub fn load_asset(state: &dyn LedgerState, uid: &str) -> Result<Option<Asset>, RuleViolation> {
    let address = asset_address(uid);
    match state.get(&address).map_err(RuleViolation::State)? {
        Some(bytes) => Ok(Some(decode_entry(&address, &bytes)?)),
        None => Ok(None),
    }
}

/// Loads the asset at `uid`, rejecting missing or deleted ones.
pub fn require_asset(state: &dyn LedgerState, uid: &str) -> Result<Asset, RuleViolation> {
    match load_asset(state, uid)? {
        Some(asset) if !asset.base().is_deleted => Ok(asset),
        _ => Err(RuleViolation::asset_not_found(uid)),
    }
}

/// Stores `asset` at its canonical address.
pub fn store_asset(state: &mut dyn LedgerState, asset: &Asset) -> Result<(), RuleViolation> {
    let bytes = serde_json::to_vec(asset).map_err(StateError::Serialization)?;
    state
        .set(&asset_address(asset.uid()), bytes)
        .map_err(RuleViolation::State)
}

/// Loads a uid list stored at an index address, empty when absent.
pub fn load_index(state: &dyn LedgerState, address: &str) -> Result<Vec<String>, RuleViolation> {
    match state.get(address).map_err(RuleViolation::State)? {
        Some(bytes) => decode_entry(address, &bytes),
        None => Ok(Vec::new()),
    }
}

/// Stores a uid list at an index address.
pub fn store_index(
    state: &mut dyn LedgerState,
    address: &str,
    entries: &[String],
) -> Result<(), RuleViolation> {
    let bytes = serde_json::to_vec(entries).map_err(StateError::Serialization)?;
    state.set(address, bytes).map_err(RuleViolation::State)
}

// =============================================================================
// PAYLOAD HELPERS
// =============================================================================

/// Rejects the payload when it declares any handler-owned field.
pub fn check_forbidden_fields(
    fields: &serde_json::Map<String, Value>,
    forbidden: &[&str],
) -> Result<(), RuleViolation> {
    for name in forbidden {
        if fields.contains_key(*name) {
            return Err(RuleViolation::MalformedPayload(format!(
                "field '{name}' may not be set by a transaction"
            )));
        }
    }
    Ok(())
}

/// A required string inside a nested payload object.
pub fn object_str<'a>(
    object: &'a serde_json::Map<String, Value>,
    name: &str,
) -> Result<&'a str, RuleViolation> {
    object
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| RuleViolation::missing_field(name))
}

/// An optional string inside a nested payload object.
#[must_use]
pub fn object_opt_str(object: &serde_json::Map<String, Value>, name: &str) -> Option<String> {
    object.get(name).and_then(Value::as_str).map(str::to_string)
}

// =============================================================================
// LIST AND EDIT HELPERS
// =============================================================================

/// Appends `value` unless already present. Keeps updaters idempotent across
/// repeated firings in one dispatch.
pub fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|entry| entry == value) {
        list.push(value.to_string());
    }
}

/// Removes every occurrence of `value`.
pub fn remove_value(list: &mut Vec<String>, value: &str) {
    list.retain(|entry| entry != value);
}

/// Applies `updates` onto a serialized entity object, returning field-level
/// deltas. The caller deserializes the result back into the entity type, so a
/// type-breaking update fails there.
pub fn apply_edits(
    entity: &mut Value,
    updates: &serde_json::Map<String, Value>,
) -> Result<BTreeMap<String, EditDelta>, RuleViolation> {
    let object = entity.as_object_mut().ok_or_else(|| {
        RuleViolation::InvariantViolation("entity did not serialize as an object".to_string())
    })?;
    let mut deltas = BTreeMap::new();
    for (name, new_value) in updates {
        let old_value = object.get(name).cloned().unwrap_or(Value::Null);
        deltas.insert(
            name.clone(),
            EditDelta {
                old: old_value,
                new: new_value.clone(),
            },
        );
        object.insert(name.clone(), new_value.clone());
    }
    Ok(deltas)
}

// =============================================================================
// TESTS
// =============================================================================
