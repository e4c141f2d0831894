//! Administrative handlers: owner edits, soft deletion, authentication
//! decisions, moderated edits and admin bookkeeping.

use crate::domain::context::EventContext;
use crate::dispatch::{Listener, Subscription, Trigger};
use crate::handlers::{
    apply_edits, load_account, load_asset, push_unique, remove_value, require_account,
    require_asset, store_account, store_asset,
};
use crate::ports::LedgerState;
use serde_json::Value;
use shared_types::accounts::{Account, AdminAction};
use shared_types::assets::Asset;
use shared_types::enums::{AccountKind, AuthenticationStatus, EventKind};
use shared_types::errors::{RuleViolation, StateError};
use shared_types::history::HistoryEntry;
use shared_types::Entity;

/// A resolved edit/delete/authentication target.
enum Target {
    Account(Account),
    Asset(Asset),
}

/// Resolves an identifier as an account first, then as an asset. The two
/// live under different address prefixes, so a public key can never shadow a
/// uid.
fn resolve_target(state: &dyn LedgerState, identifier: &str) -> Result<Target, RuleViolation> {
    if let Some(account) = load_account(state, identifier)? {
        return Ok(Target::Account(account));
    }
    if let Some(asset) = load_asset(state, identifier)? {
        return Ok(Target::Asset(asset));
    }
    Err(RuleViolation::NotFound {
        kind: "entity",
        identifier: identifier.to_string(),
    })
}

fn edit_account(
    mut account: Account,
    updates: &serde_json::Map<String, Value>,
    entry: HistoryEntry,
) -> Result<Account, RuleViolation> {
    let kind = account.kind();
    for name in updates.keys() {
        if !kind.editable_fields().contains(&name.as_str()) {
            return Err(RuleViolation::Unauthorized(format!(
                "field '{name}' is not editable on this account"
            )));
        }
    }
    let mut value = serde_json::to_value(&account).map_err(StateError::Serialization)?;
    let deltas = apply_edits(&mut value, updates)?;
    account = serde_json::from_value(value)
        .map_err(|e| RuleViolation::MalformedPayload(e.to_string()))?;
    account.history_mut().push(entry.with_edits(deltas));
    Ok(account)
}

fn edit_asset(
    mut asset: Asset,
    updates: &serde_json::Map<String, Value>,
    entry: HistoryEntry,
) -> Result<Asset, RuleViolation> {
    let kind = asset.kind();
    if kind.editable_fields().is_empty() {
        return Err(RuleViolation::InvalidStateTransition(format!(
            "{} assets are immutable once created",
            kind.as_str()
        )));
    }
    if let Some(material) = asset.as_raw_material() {
        if material.processor.is_some() {
            return Err(RuleViolation::InvalidStateTransition(format!(
                "raw material '{}' is locked after processing",
                asset.uid()
            )));
        }
    }
    for name in updates.keys() {
        if !kind.editable_fields().contains(&name.as_str()) {
            return Err(RuleViolation::Unauthorized(format!(
                "field '{name}' is not editable on a {}",
                kind.as_str()
            )));
        }
    }
    let mut value = serde_json::to_value(&asset).map_err(StateError::Serialization)?;
    let deltas = apply_edits(&mut value, updates)?;
    asset =
        serde_json::from_value(value).map_err(|e| RuleViolation::MalformedPayload(e.to_string()))?;
    asset.history_mut().push(entry.with_edits(deltas));
    Ok(asset)
}

// =============================================================================
// OWNER EDITS
// =============================================================================

/// Applies an owner's edit to their own entity, constrained to the kind's
/// editable fields, with field-level deltas recorded in history.
pub struct EditEntity;

impl Listener for EditEntity {
    fn name(&self) -> &'static str {
        "EditEntity"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::EntityEdited),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let target = ctx.require_str("target")?.to_string();
        let updates = ctx.require_object("updates")?.clone();
        if updates.is_empty() {
            return Err(RuleViolation::MalformedPayload(
                "an edit must change at least one field".to_string(),
            ));
        }
        let entry = HistoryEntry::new(
            self.name(),
            ctx.event().as_str(),
            ctx.signer(),
            vec![target.clone()],
            ctx.signature(),
            ctx.timestamp(),
        );
        match resolve_target(&*state, &target)? {
            Target::Account(account) => {
                if account.base().is_deleted {
                    return Err(RuleViolation::account_not_found(&target));
                }
                if account.public_key() != ctx.signer() {
                    return Err(RuleViolation::Unauthorized(
                        "accounts are edited by their owner".to_string(),
                    ));
                }
                let edited = edit_account(account, &updates, entry)?;
                store_account(state, &edited)?;
            }
            Target::Asset(asset) => {
                if asset.base().is_deleted {
                    return Err(RuleViolation::asset_not_found(&target));
                }
                if asset.base().owner != ctx.signer() {
                    return Err(RuleViolation::Unauthorized(
                        "assets are edited by their owner".to_string(),
                    ));
                }
                let edited = edit_asset(asset, &updates, entry)?;
                store_asset(state, &edited)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// SOFT DELETION
// =============================================================================

/// Marks an entity deleted. The record and its history stay in the ledger.
pub struct DeleteEntity;

impl Listener for DeleteEntity {
    fn name(&self) -> &'static str {
        "DeleteEntity"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::EntityDeleted),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let target = ctx.require_str("target")?.to_string();
        let reason = ctx.require_str("reason")?.to_string();
        match resolve_target(&*state, &target)? {
            Target::Account(mut account) => {
                if account.base().is_deleted {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "account '{target}' is already deleted"
                    )));
                }
                if account.public_key() != ctx.signer() {
                    return Err(RuleViolation::Unauthorized(
                        "accounts are deleted by their owner".to_string(),
                    ));
                }
                account.mark_deleted(reason);
                store_account(state, &account)?;
            }
            Target::Asset(mut asset) => {
                if asset.base().is_deleted {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "asset '{target}' is already deleted"
                    )));
                }
                if asset.base().owner != ctx.signer() {
                    return Err(RuleViolation::Unauthorized(
                        "assets are deleted by their owner".to_string(),
                    ));
                }
                if let Some(batch) = asset.as_product_batch() {
                    if batch.status == shared_types::enums::BatchStatus::InProgress {
                        return Err(RuleViolation::InvalidStateTransition(format!(
                            "batch '{target}' is still in progress"
                        )));
                    }
                }
                if let Some(packaging) = asset.as_packaging() {
                    if !packaging.products.is_empty() {
                        return Err(RuleViolation::InvariantViolation(format!(
                            "packaging '{target}' still contains products"
                        )));
                    }
                }
                asset.mark_deleted(reason);
                store_asset(state, &asset)?;
                // The owner stops listing the asset; the record itself stays.
                let mut owner = require_account(&*state, ctx.signer())?;
                remove_value(&mut owner.base_mut().assets, &target);
                store_account(state, &owner)?;
            }
        }
        ctx.note_target(&target);
        Ok(())
    }
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Records an authenticator's decision on a pending entity. One-way.
pub struct AuthenticateEntity;

impl Listener for AuthenticateEntity {
    fn name(&self) -> &'static str {
        "AuthenticateEntity"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::EntityAuthenticated),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let target = ctx.require_str("target")?.to_string();
        let decision_tag = ctx.require_str("decision")?;
        let decision: AuthenticationStatus =
            serde_json::from_value(Value::String(decision_tag.to_string())).map_err(|_| {
                RuleViolation::MalformedPayload(format!("unknown decision '{decision_tag}'"))
            })?;
        if decision == AuthenticationStatus::Pending {
            return Err(RuleViolation::MalformedPayload(
                "a decision must approve or reject".to_string(),
            ));
        }
        match resolve_target(&*state, &target)? {
            Target::Account(mut account) => {
                if account.base().is_deleted {
                    return Err(RuleViolation::account_not_found(&target));
                }
                if account.base().authentication_status != AuthenticationStatus::Pending {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "account '{target}' is already authenticated"
                    )));
                }
                account.set_authentication_status(decision);
                store_account(state, &account)?;
            }
            Target::Asset(mut asset) => {
                if asset.base().is_deleted {
                    return Err(RuleViolation::asset_not_found(&target));
                }
                if asset.base().authentication_status != AuthenticationStatus::Pending {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "asset '{target}' is already authenticated"
                    )));
                }
                asset.set_authentication_status(decision);
                store_asset(state, &asset)?;
            }
        }
        ctx.note_target(&target);
        Ok(())
    }
}

// =============================================================================
// MODERATED EDITS
// =============================================================================

/// Applies a moderator's edits across declared accounts and assets, under
/// the same editable-field constraints as owner edits. Admin accounts are
/// out of reach.
pub struct ModeratorEdit;

impl Listener for ModeratorEdit {
    fn name(&self) -> &'static str {
        "ModeratorEdit"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::ModeratorEdited),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let account_updates = match ctx.fields().get("account_updates") {
            Some(Value::Object(map)) => map.clone(),
            None => serde_json::Map::new(),
            Some(_) => {
                return Err(RuleViolation::MalformedPayload(
                    "field 'account_updates' must be an object".to_string(),
                ))
            }
        };
        let asset_updates = match ctx.fields().get("asset_updates") {
            Some(Value::Object(map)) => map.clone(),
            None => serde_json::Map::new(),
            Some(_) => {
                return Err(RuleViolation::MalformedPayload(
                    "field 'asset_updates' must be an object".to_string(),
                ))
            }
        };
        if account_updates.is_empty() && asset_updates.is_empty() {
            return Err(RuleViolation::MalformedPayload(
                "a moderated edit must change at least one entity".to_string(),
            ));
        }

        for (public_key, updates) in &account_updates {
            let updates = updates.as_object().ok_or_else(|| {
                RuleViolation::MalformedPayload(format!(
                    "updates for account '{public_key}' must be an object"
                ))
            })?;
            let account = require_account(&*state, public_key)?;
            if account.kind() == AccountKind::Admin {
                return Err(RuleViolation::Unauthorized(
                    "admin accounts cannot be moderated".to_string(),
                ));
            }
            let entry = HistoryEntry::new(
                self.name(),
                ctx.event().as_str(),
                ctx.signer(),
                vec![public_key.clone()],
                ctx.signature(),
                ctx.timestamp(),
            );
            let edited = edit_account(account, updates, entry)?;
            store_account(state, &edited)?;
        }

        for (uid, updates) in &asset_updates {
            let updates = updates.as_object().ok_or_else(|| {
                RuleViolation::MalformedPayload(format!(
                    "updates for asset '{uid}' must be an object"
                ))
            })?;
            let asset = require_asset(&*state, uid)?;
            let entry = HistoryEntry::new(
                self.name(),
                ctx.event().as_str(),
                ctx.signer(),
                vec![uid.clone()],
                ctx.signature(),
                ctx.timestamp(),
            );
            let edited = edit_asset(asset, updates, entry)?;
            store_asset(state, &edited)?;
        }
        Ok(())
    }
}

// =============================================================================
// CERTIFICATION PLUMBING
// =============================================================================

/// Attaches a freshly issued certification to its holder's certification
/// list. The holder may be an account or an asset.
pub struct CertificateHolderUpdater;

impl Listener for CertificateHolderUpdater {
    fn name(&self) -> &'static str {
        "CertificateHolderUpdater"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::CertificationIssued),
            -200,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let uid = ctx.require_str("uid")?.to_string();
        let asset = require_asset(&*state, &uid)?;
        let certification = asset.as_certification().ok_or_else(|| {
            RuleViolation::InvariantViolation(format!("asset '{uid}' is not a certification"))
        })?;
        let holder = certification.holder.clone();
        match resolve_target(&*state, &holder)? {
            Target::Account(mut account) => {
                if account.base().is_deleted {
                    return Err(RuleViolation::account_not_found(&holder));
                }
                push_unique(account.certifications_mut(), &uid);
                store_account(state, &account)?;
            }
            Target::Asset(mut held) => {
                if held.base().is_deleted {
                    return Err(RuleViolation::asset_not_found(&holder));
                }
                push_unique(held.certifications_mut(), &uid);
                store_asset(state, &held)?;
            }
        }
        ctx.note_target(&holder);
        Ok(())
    }
}

// =============================================================================
// ADMIN ACTION LOG
// =============================================================================

/// Appends an entry to the acting admin's action log for every admin-gated
/// event.
pub struct AdminActionsUpdater;

impl Listener for AdminActionsUpdater {
    fn name(&self) -> &'static str {
        "AdminActionsUpdater"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::AdminCreated), -300),
            Subscription::new(Trigger::Event(EventKind::CertificationIssued), -300),
            Subscription::new(Trigger::Event(EventKind::ModeratorEdited), -300),
            Subscription::new(Trigger::Event(EventKind::EntityAuthenticated), -300),
        ]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let mut account = require_account(&*state, ctx.signer())?;
        let admin = account.as_admin_mut().ok_or_else(|| {
            RuleViolation::Unauthorized("admin events require an admin signer".to_string())
        })?;
        let details = ctx
            .opt_str("details")?
            .map_or_else(|| ctx.event().as_str().to_string(), str::to_string);
        admin.actions.push(AdminAction {
            details,
            transaction: ctx.signature().to_string(),
            timestamp: ctx.timestamp().to_string(),
        });
        let signer = ctx.signer().to_string();
        store_account(state, &account)?;
        ctx.note_target(&signer);
        Ok(())
    }
}
