//! Creation handlers: bootstrap, accounts, admins, assets, certifications and
//! product minting.
//!
//! Creators run at the head of their chains. They stamp every handler-owned
//! field themselves (owner, signer-derived identities, timestamps) after
//! rejecting payloads that try to declare one.

use crate::domain::addressing::bootstrap_address;
use crate::domain::context::{EventContext, SCRATCH_CREATED_ASSETS, SCRATCH_TRANSFERRED_ASSETS};
use crate::dispatch::{Listener, Subscription, Trigger};
use crate::handlers::{
    check_forbidden_fields, load_account, load_asset, object_opt_str, object_str, require_asset,
    store_account, store_asset,
};
use crate::ports::{LedgerState, StateReader, StateWriter};
use serde_json::{json, Value};
use shared_types::accounts::{Account, AdminAccount};
use shared_types::assets::{Asset, AssetBase, Certification, Logistics, Product, ProductBatch};
use shared_types::enums::{
    AccountKind, AdminLevel, AssetKind, BatchStatus, EventKind, SubEventKind,
};
use shared_types::errors::RuleViolation;
use shared_types::history::HistoryEntry;
use std::collections::BTreeMap;
use tracing::info;

fn parse_account_kind(tag: &str) -> Result<AccountKind, RuleViolation> {
    serde_json::from_value(Value::String(tag.to_string()))
        .map_err(|_| RuleViolation::MalformedPayload(format!("unknown account type '{tag}'")))
}

fn parse_asset_kind(tag: &str) -> Result<AssetKind, RuleViolation> {
    serde_json::from_value(Value::String(tag.to_string()))
        .map_err(|_| RuleViolation::MalformedPayload(format!("unknown asset type '{tag}'")))
}

fn reject_existing_asset(state: &dyn LedgerState, uid: &str) -> Result<(), RuleViolation> {
    // Asset uids are never reused, deleted or not.
    if load_asset(state, uid)?.is_some() {
        return Err(RuleViolation::DuplicateEntity {
            kind: "asset",
            identifier: uid.to_string(),
        });
    }
    Ok(())
}

fn note_created(ctx: &mut EventContext, uid: &str, kind: AssetKind) {
    ctx.note_target(uid);
    ctx.push_data(SCRATCH_CREATED_ASSETS, json!([uid, kind.as_str()]));
}

/// Creation entry for entities minted by derived sub-event chains, which run
/// after the history updater on the primary event.
fn derived_creation_entry(ctx: &EventContext, uid: &str) -> HistoryEntry {
    HistoryEntry::new(
        "AssetCreation",
        ctx.event().as_str(),
        ctx.signer(),
        vec![uid.to_string()],
        ctx.signature(),
        ctx.timestamp(),
    )
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

/// One-time ledger initialization: mints the single super admin and sets the
/// bootstrap flag.
pub struct Bootstrap;

impl Listener for Bootstrap {
    fn name(&self) -> &'static str {
        "Bootstrap"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(Trigger::Event(EventKind::Bootstrap), 1000)]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let flag_address = bootstrap_address();
        if state.get(&flag_address).map_err(RuleViolation::State)?.is_some() {
            return Err(RuleViolation::InvariantViolation(
                "ledger is already bootstrapped".to_string(),
            ));
        }
        let email = ctx.require_str("email")?;
        if load_account(state, ctx.signer())?.is_some() {
            return Err(RuleViolation::DuplicateEntity {
                kind: "account",
                identifier: ctx.signer().to_string(),
            });
        }
        let admin = AdminAccount {
            base: shared_types::accounts::AccountBase::new(ctx.signer(), email, ctx.timestamp()),
            permission_level: AdminLevel::SuperAdmin,
            status: shared_types::enums::AdminStatus::Active,
            actions: Vec::new(),
        };
        let signer = ctx.signer().to_string();
        store_account(state, &Account::Admin(admin))?;
        state
            .set(&flag_address, serde_json::to_vec(&json!(true)).map_err(
                shared_types::errors::StateError::Serialization,
            )?)
            .map_err(RuleViolation::State)?;
        ctx.note_target(&signer);
        info!(super_admin = %signer, "ledger bootstrapped");
        Ok(())
    }
}

// =============================================================================
// ACCOUNT CREATION
// =============================================================================

/// Creates supplier, artisan and buyer accounts for the transaction signer.
pub struct AccountCreation;

impl Listener for AccountCreation {
    fn name(&self) -> &'static str {
        "AccountCreation"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::AccountCreated),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let kind = parse_account_kind(ctx.require_str("account_type")?)?;
        if kind == AccountKind::Admin {
            return Err(RuleViolation::Unauthorized(
                "admin accounts are created via create/admin".to_string(),
            ));
        }
        check_forbidden_fields(ctx.fields(), kind.forbidden_fields())?;
        ctx.require_str("email")?;
        if let Some(existing) = load_account(state, ctx.signer())? {
            // A deleted account frees its public key for re-registration.
            if !existing.base().is_deleted {
                return Err(RuleViolation::DuplicateEntity {
                    kind: "account",
                    identifier: ctx.signer().to_string(),
                });
            }
        }

        let mut object = ctx.fields().clone();
        object.insert("public_key".into(), json!(ctx.signer()));
        object.insert("created_timestamp".into(), json!(ctx.timestamp()));
        let account: Account = serde_json::from_value(Value::Object(object))
            .map_err(|e| RuleViolation::MalformedPayload(e.to_string()))?;

        let signer = ctx.signer().to_string();
        store_account(state, &account)?;
        ctx.note_target(&signer);
        Ok(())
    }
}

// =============================================================================
// ADMIN CREATION
// =============================================================================

/// Mints a new admin account for a declared public key. Authorization to do
/// so is enforced by the admin validator later in the chain.
pub struct AdminCreation;

impl Listener for AdminCreation {
    fn name(&self) -> &'static str {
        "AdminCreation"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::AdminCreated),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        check_forbidden_fields(ctx.fields(), AccountKind::Admin.forbidden_fields())?;
        // "public_key" is handler-owned, so the new admin's key arrives under
        // its own field name.
        let target = ctx.require_str("target_public_key")?;
        let email = ctx.require_str("email")?;
        let level: AdminLevel = match ctx.opt_str("permission_level")? {
            Some(tag) => serde_json::from_value(Value::String(tag.to_string())).map_err(|_| {
                RuleViolation::MalformedPayload(format!("unknown permission level '{tag}'"))
            })?,
            None => AdminLevel::Moderator,
        };
        if level == AdminLevel::SuperAdmin {
            return Err(RuleViolation::InvariantViolation(
                "the super admin exists exactly once, minted at bootstrap".to_string(),
            ));
        }
        if let Some(existing) = load_account(state, target)? {
            if !existing.base().is_deleted {
                return Err(RuleViolation::DuplicateEntity {
                    kind: "account",
                    identifier: target.to_string(),
                });
            }
        }
        let admin = AdminAccount {
            base: shared_types::accounts::AccountBase::new(target, email, ctx.timestamp()),
            permission_level: level,
            status: shared_types::enums::AdminStatus::Active,
            actions: Vec::new(),
        };
        let target = target.to_string();
        store_account(state, &Account::Admin(admin))?;
        ctx.note_target(&target);
        Ok(())
    }
}

// =============================================================================
// ASSET CREATION
// =============================================================================

/// Creates client-declared assets, the batch derived from a work-order
/// acceptance, and the logistics record derived from a transfer.
pub struct AssetCreation;

impl AssetCreation {
    fn create_declared(
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let kind = parse_asset_kind(ctx.require_str("asset_type")?)?;
        if matches!(
            kind,
            AssetKind::Product | AssetKind::Logistics | AssetKind::Certification
        ) {
            return Err(RuleViolation::Unauthorized(format!(
                "{} assets are system-minted and cannot be declared",
                kind.as_str()
            )));
        }
        check_forbidden_fields(ctx.fields(), kind.forbidden_fields())?;
        let uid = ctx.require_str("uid")?.to_string();
        reject_existing_asset(state, &uid)?;

        let mut object = ctx.fields().clone();
        object.insert("owner".into(), json!(ctx.signer()));
        object.insert("created_timestamp".into(), json!(ctx.timestamp()));
        match kind {
            AssetKind::RawMaterial => {
                object.insert("supplier".into(), json!(ctx.signer()));
            }
            AssetKind::WorkOrder | AssetKind::SubAssignment => {
                object.insert("assigner".into(), json!(ctx.signer()));
            }
            AssetKind::ProductBatch => {
                object.insert("producer".into(), json!(ctx.signer()));
            }
            _ => {}
        }
        let asset: Asset = serde_json::from_value(Value::Object(object))
            .map_err(|e| RuleViolation::MalformedPayload(e.to_string()))?;
        if let Some(material) = asset.as_raw_material() {
            if material.quantity <= 0.0 {
                return Err(RuleViolation::MalformedPayload(
                    "raw material quantity must be positive".to_string(),
                ));
            }
        }
        store_asset(state, &asset)?;
        note_created(ctx, &uid, kind);
        Ok(())
    }

    fn create_batch_from_acceptance(
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let order_uid = ctx.require_str("uid")?.to_string();
        let batch_uid = ctx.require_str("batch")?.to_string();
        let asset = require_asset(&*state, &order_uid)?;
        let order = asset.as_work_order().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{order_uid}' is not a work order"))
        })?;
        reject_existing_asset(state, &batch_uid)?;

        // The work-order handler already linked the batch; the order carries
        // quantity, description and specs forward.
        #[allow(clippy::cast_precision_loss)]
        let mut batch = ProductBatch {
            base: AssetBase::new(&batch_uid, ctx.signer(), ctx.timestamp()),
            producer: ctx.signer().to_string(),
            quantity: order.order_quantity as f64,
            unit: order.quantity_unit.clone(),
            status: BatchStatus::InProgress,
            raw_materials: Vec::new(),
            sub_assignments: Vec::new(),
            work_order: Some(order_uid),
            units_produced: None,
            production_date: String::new(),
            product_description: order.product_description.clone(),
            specifications: order.specifications.clone(),
        };
        batch.base.history.push(derived_creation_entry(ctx, &batch_uid));
        store_asset(state, &Asset::ProductBatch(batch))?;
        note_created(ctx, &batch_uid, AssetKind::ProductBatch);
        Ok(())
    }

    fn create_logistics_from_transfer(
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let details = ctx.require_object("logistics")?.clone();
        let uid = object_str(&details, "uid")?.to_string();
        reject_existing_asset(state, &uid)?;

        // The transferrer recorded the expanded asset list, packaged products
        // included.
        let mut moved = Vec::new();
        if let Some(Value::Array(entries)) = ctx.get_data(SCRATCH_TRANSFERRED_ASSETS) {
            for entry in entries {
                if let Some(asset_uid) = entry.get(0).and_then(Value::as_str) {
                    moved.push(asset_uid.to_string());
                }
            }
        }
        if moved.is_empty() {
            return Err(RuleViolation::InvariantViolation(
                "transfer moved no assets".to_string(),
            ));
        }

        let mut record = Logistics {
            base: AssetBase::new(&uid, ctx.signer(), ctx.timestamp()),
            transaction: ctx.signature().to_string(),
            assets: moved,
            carrier: object_str(&details, "carrier")?.to_string(),
            origin: object_str(&details, "origin")?.to_string(),
            destination: object_str(&details, "destination")?.to_string(),
            recipient: ctx.require_str("recipient")?.to_string(),
            dispatch_date: object_str(&details, "dispatch_date")?.to_string(),
            tracking_id: object_opt_str(&details, "tracking_id"),
        };
        record.base.history.push(derived_creation_entry(ctx, &uid));
        store_asset(state, &Asset::Logistics(record))?;
        note_created(ctx, &uid, AssetKind::Logistics);
        Ok(())
    }
}

impl Listener for AssetCreation {
    fn name(&self) -> &'static str {
        "AssetCreation"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::AssetCreated), 1000),
            Subscription::new(Trigger::Sub(SubEventKind::BatchCreated), 1000),
            Subscription::new(Trigger::Sub(SubEventKind::LogisticsCreated), 0),
        ]
    }

    fn on_event(
        &self,
        trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        match trigger {
            Trigger::Event(EventKind::AssetCreated) => Self::create_declared(ctx, state),
            Trigger::Sub(SubEventKind::BatchCreated) => {
                Self::create_batch_from_acceptance(ctx, state)
            }
            Trigger::Sub(SubEventKind::LogisticsCreated) => {
                Self::create_logistics_from_transfer(ctx, state)
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// CERTIFICATION ISSUANCE
// =============================================================================

/// Mints a certification asset issued by the signing admin.
pub struct CertificationIssuer;

impl Listener for CertificationIssuer {
    fn name(&self) -> &'static str {
        "CertificationIssuer"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::CertificationIssued),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let uid = ctx.require_str("uid")?.to_string();
        reject_existing_asset(state, &uid)?;
        let extra: BTreeMap<String, Value> = match ctx.fields().get("extra") {
            Some(Value::Object(map)) => map.clone().into_iter().collect(),
            Some(_) => {
                return Err(RuleViolation::MalformedPayload(
                    "field 'extra' must be an object".to_string(),
                ))
            }
            None => BTreeMap::new(),
        };
        let certification = Certification {
            base: AssetBase::new(&uid, ctx.signer(), ctx.timestamp()),
            title: ctx.require_str("title")?.to_string(),
            issuer: ctx.signer().to_string(),
            holder: ctx.require_str("holder")?.to_string(),
            issue_timestamp: ctx.timestamp().to_string(),
            expiry_timestamp: ctx.opt_str("expiry_timestamp")?.map(str::to_string),
            description: ctx.opt_str("description")?.unwrap_or_default().to_string(),
            extra,
        };
        store_asset(state, &Asset::Certification(certification))?;
        note_created(ctx, &uid, AssetKind::Certification);
        Ok(())
    }
}

// =============================================================================
// PRODUCT MINTING
// =============================================================================

/// Mints one product per produced unit when a batch completes, directly or
/// through its work order.
pub struct ProductsCreation;

impl Listener for ProductsCreation {
    fn name(&self) -> &'static str {
        "ProductsCreation"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::WorkOrderCompleted), -200),
            Subscription::new(Trigger::Event(EventKind::BatchCompleted), -200),
        ]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let batch_uid = crate::handlers::workflow::resolve_completed_batch(ctx, &*state)?;
        let asset = require_asset(&*state, &batch_uid)?;
        let batch = asset.as_product_batch().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{batch_uid}' is not a product batch"))
        })?;
        let units = batch.units_produced.ok_or_else(|| {
            RuleViolation::InvariantViolation(format!(
                "batch '{batch_uid}' completed without a produced unit count"
            ))
        })?;
        let unit_price = ctx
            .fields()
            .get("unit_price")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let owner = batch.base.owner.clone();
        let unit = batch.unit.clone();
        for serial_no in 1..=units {
            let product_uid = format!("{batch_uid}-{serial_no}");
            reject_existing_asset(state, &product_uid)?;
            let product = Product {
                base: AssetBase::new(&product_uid, &owner, ctx.timestamp()),
                batch: batch_uid.clone(),
                serial_no,
                price: unit_price,
                quantity: 1.0,
                unit: unit.clone(),
                packaging: None,
            };
            store_asset(state, &Asset::Product(product))?;
            note_created(ctx, &product_uid, AssetKind::Product);
        }
        info!(batch = %batch_uid, units, "products minted");
        Ok(())
    }
}
