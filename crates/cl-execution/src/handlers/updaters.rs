//! Bookkeeping updaters: ownership lists, secondary indices, entity history
//! and email uniqueness. All of them are idempotent per dispatch, so firing
//! on several triggers of the same transaction is harmless.

use crate::domain::addressing::{email_index_address, kind_index_address, owner_index_address};
use crate::domain::context::{
    EventContext, SCRATCH_CREATED_ASSETS, SCRATCH_TRANSFERRED_ASSETS,
};
use crate::dispatch::{Listener, Subscription, Trigger};
use crate::handlers::{
    load_account, load_asset, load_index, push_unique, remove_value, require_account,
    require_asset, store_account, store_asset, store_index,
};
use crate::ports::{LedgerState, StateReader, StateWriter};
use serde_json::Value;
use shared_types::enums::{AssetKind, EventKind, SubEventKind};
use shared_types::errors::{RuleViolation, StateError};
use shared_types::history::HistoryEntry;
use shared_types::Entity;

fn scratch_created(ctx: &EventContext) -> Vec<(String, AssetKind)> {
    let mut created = Vec::new();
    if let Some(Value::Array(entries)) = ctx.get_data(SCRATCH_CREATED_ASSETS) {
        for entry in entries {
            let uid = entry.get(0).and_then(Value::as_str);
            let kind = entry
                .get(1)
                .and_then(Value::as_str)
                .and_then(|tag| serde_json::from_value(Value::String(tag.to_string())).ok());
            if let (Some(uid), Some(kind)) = (uid, kind) {
                created.push((uid.to_string(), kind));
            }
        }
    }
    created
}

fn scratch_transferred(ctx: &EventContext) -> Vec<(String, AssetKind, String, String)> {
    let mut moved = Vec::new();
    if let Some(Value::Array(entries)) = ctx.get_data(SCRATCH_TRANSFERRED_ASSETS) {
        for entry in entries {
            let uid = entry.get(0).and_then(Value::as_str);
            let kind = entry
                .get(1)
                .and_then(Value::as_str)
                .and_then(|tag| serde_json::from_value(Value::String(tag.to_string())).ok());
            let from = entry.get(2).and_then(Value::as_str);
            let to = entry.get(3).and_then(Value::as_str);
            if let (Some(uid), Some(kind), Some(from), Some(to)) = (uid, kind, from, to) {
                moved.push((uid.to_string(), kind, from.to_string(), to.to_string()));
            }
        }
    }
    moved
}

// =============================================================================
// OWNERSHIP LISTS
// =============================================================================

/// Keeps every account's `assets` list, and the supplier's material lists, in
/// step with creations and transfers recorded earlier in the dispatch.
pub struct OwnerHistoryUpdater;

impl Listener for OwnerHistoryUpdater {
    fn name(&self) -> &'static str {
        "OwnerHistoryUpdater"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::AssetCreated), -150),
            Subscription::new(Trigger::Sub(SubEventKind::BatchCreated), -150),
            Subscription::new(Trigger::Sub(SubEventKind::LogisticsCreated), -150),
            Subscription::new(Trigger::Event(EventKind::AssetsTransferred), -150),
            Subscription::new(Trigger::Event(EventKind::CertificationIssued), -250),
            Subscription::new(Trigger::Event(EventKind::WorkOrderCompleted), -250),
            Subscription::new(Trigger::Event(EventKind::BatchCompleted), -250),
        ]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        for (uid, kind) in scratch_created(ctx) {
            let asset = require_asset(&*state, &uid)?;
            let owner = asset.base().owner.clone();
            let mut account = require_account(&*state, &owner)?;
            push_unique(&mut account.base_mut().assets, &uid);
            if kind == AssetKind::RawMaterial {
                if let shared_types::accounts::Account::Supplier(supplier) = &mut account {
                    push_unique(&mut supplier.raw_materials_created, &uid);
                }
            }
            store_account(state, &account)?;
            ctx.note_target(&owner);
        }

        for (uid, kind, from, to) in scratch_transferred(ctx) {
            let mut sender = require_account(&*state, &from)?;
            remove_value(&mut sender.base_mut().assets, &uid);
            if kind == AssetKind::RawMaterial {
                if let shared_types::accounts::Account::Supplier(supplier) = &mut sender {
                    push_unique(&mut supplier.raw_materials_supplied, &uid);
                }
            }
            store_account(state, &sender)?;

            let mut recipient = require_account(&*state, &to)?;
            push_unique(&mut recipient.base_mut().assets, &uid);
            store_account(state, &recipient)?;
        }
        Ok(())
    }
}

// =============================================================================
// SECONDARY INDICES
// =============================================================================

/// Maintains the owner index and the kind index for query-side lookups.
pub struct AssetIndexUpdater;

impl AssetIndexUpdater {
    fn index_add(
        state: &mut dyn LedgerState,
        address: &str,
        uid: &str,
    ) -> Result<(), RuleViolation> {
        let mut entries = load_index(&*state, address)?;
        push_unique(&mut entries, uid);
        store_index(state, address, &entries)
    }

    fn index_remove(
        state: &mut dyn LedgerState,
        address: &str,
        uid: &str,
    ) -> Result<(), RuleViolation> {
        let mut entries = load_index(&*state, address)?;
        remove_value(&mut entries, uid);
        store_index(state, address, &entries)
    }
}

impl Listener for AssetIndexUpdater {
    fn name(&self) -> &'static str {
        "AssetIndexUpdater"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::AssetCreated), -500),
            Subscription::new(Trigger::Sub(SubEventKind::BatchCreated), -500),
            Subscription::new(Trigger::Sub(SubEventKind::LogisticsCreated), -500),
            Subscription::new(Trigger::Event(EventKind::CertificationIssued), -500),
            Subscription::new(Trigger::Event(EventKind::AssetsTransferred), -500),
            Subscription::new(Trigger::Event(EventKind::WorkOrderCompleted), -500),
            Subscription::new(Trigger::Event(EventKind::BatchCompleted), -500),
            Subscription::new(Trigger::Event(EventKind::EntityDeleted), -500),
        ]
    }

    fn on_event(
        &self,
        trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        if trigger == Trigger::Event(EventKind::EntityDeleted) {
            let target = ctx.require_str("target")?.to_string();
            if let Some(asset) = load_asset(&*state, &target)? {
                let owner = asset.base().owner.clone();
                Self::index_remove(state, &owner_index_address(&owner), &target)?;
                Self::index_remove(state, &kind_index_address(asset.kind()), &target)?;
            }
            return Ok(());
        }

        for (uid, kind) in scratch_created(ctx) {
            let asset = require_asset(&*state, &uid)?;
            let owner = asset.base().owner.clone();
            Self::index_add(state, &owner_index_address(&owner), &uid)?;
            Self::index_add(state, &kind_index_address(kind), &uid)?;
        }

        for (uid, _, from, to) in scratch_transferred(ctx) {
            Self::index_remove(state, &owner_index_address(&from), &uid)?;
            Self::index_add(state, &owner_index_address(&to), &uid)?;
        }
        Ok(())
    }
}

// =============================================================================
// ENTITY HISTORY
// =============================================================================

/// Appends one history entry per touched entity, for every transaction. Runs
/// once per dispatch, on the primary event only.
pub struct EntityHistoryUpdater;

impl Listener for EntityHistoryUpdater {
    fn name(&self) -> &'static str {
        "EntityHistoryUpdater"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        EventKind::ALL
            .into_iter()
            .map(|event| Subscription::new(Trigger::Event(event), -900))
            .collect()
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let targets = ctx.targets();
        if targets.is_empty() {
            return Ok(());
        }
        let entry = HistoryEntry::new(
            self.name(),
            ctx.event().as_str(),
            ctx.signer(),
            targets.clone(),
            ctx.signature(),
            ctx.timestamp(),
        );
        for target in &targets {
            // Deleted entities still receive the entry recording what
            // happened to them.
            if let Some(mut account) = load_account(&*state, target)? {
                account.history_mut().push(entry.clone());
                store_account(state, &account)?;
            } else if let Some(mut asset) = load_asset(&*state, target)? {
                asset.history_mut().push(entry.clone());
                store_asset(state, &asset)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// EMAIL UNIQUENESS
// =============================================================================

/// Enforces one non-deleted account per email through the email index, and
/// frees the entry when an account is deleted.
pub struct EmailIndexUpdater;

impl Listener for EmailIndexUpdater {
    fn name(&self) -> &'static str {
        "EmailIndexUpdater"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::Bootstrap), -1000),
            Subscription::new(Trigger::Event(EventKind::AccountCreated), -1000),
            Subscription::new(Trigger::Event(EventKind::AdminCreated), -1000),
            Subscription::new(Trigger::Event(EventKind::EntityDeleted), -1000),
        ]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        if ctx.event() == EventKind::EntityDeleted {
            let target = ctx.require_str("target")?.to_string();
            if let Some(account) = load_account(&*state, &target)? {
                let address = email_index_address(&account.base().email);
                let indexed: Option<String> = state
                    .get(&address)
                    .map_err(RuleViolation::State)?
                    .map(|bytes| {
                        serde_json::from_slice(&bytes).map_err(|source| {
                            StateError::CorruptEntry {
                                address: address.clone(),
                                source,
                            }
                        })
                    })
                    .transpose()?;
                if indexed.as_deref() == Some(&target) {
                    state.delete(&address).map_err(RuleViolation::State)?;
                }
            }
            return Ok(());
        }

        let public_key = match ctx.event() {
            EventKind::AdminCreated => ctx.require_str("target_public_key")?.to_string(),
            _ => ctx.signer().to_string(),
        };
        let account = require_account(&*state, &public_key)?;
        let email = account.base().email.clone();
        let address = email_index_address(&email);
        if let Some(bytes) = state.get(&address).map_err(RuleViolation::State)? {
            let indexed: String =
                serde_json::from_slice(&bytes).map_err(|source| StateError::CorruptEntry {
                    address: address.clone(),
                    source,
                })?;
            if indexed != public_key {
                let holder_active = load_account(&*state, &indexed)?
                    .is_some_and(|holder| !holder.base().is_deleted);
                if holder_active {
                    return Err(RuleViolation::DuplicateEntity {
                        kind: "email",
                        identifier: email,
                    });
                }
            }
        }
        let bytes = serde_json::to_vec(&public_key).map_err(StateError::Serialization)?;
        state.set(&address, bytes).map_err(RuleViolation::State)?;
        Ok(())
    }
}
