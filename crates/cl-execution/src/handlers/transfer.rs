//! Transfer handlers: ownership changes, packaging coupling and unpacking.

use crate::domain::context::{EventContext, SCRATCH_TRANSFERRED_ASSETS};
use crate::dispatch::{Listener, Subscription, Trigger};
use crate::handlers::{object_str, remove_value, require_asset, store_asset};
use crate::ports::LedgerState;
use serde_json::json;
use shared_types::assets::Asset;
use shared_types::enums::{EventKind, SubEventKind};
use shared_types::errors::RuleViolation;
use tracing::debug;

// =============================================================================
// TRANSFER
// =============================================================================

/// Moves the declared assets to the recipient, expanding packagings to carry
/// their contained products along.
///
/// Transferability rules live in the transfer validator, which inspects the
/// staged result at the tail of the chain.
pub struct AssetsTransferrer;

impl Listener for AssetsTransferrer {
    fn name(&self) -> &'static str {
        "AssetsTransferrer"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::AssetsTransferred),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let declared = ctx.require_str_list("assets")?;
        if declared.is_empty() {
            return Err(RuleViolation::MalformedPayload(
                "a transfer must declare at least one asset".to_string(),
            ));
        }
        let recipient = ctx.require_str("recipient")?.to_string();
        let logistics_uid = object_str(ctx.require_object("logistics")?, "uid")?.to_string();

        // Expand packagings: contained products always travel with their
        // packaging. A declared uid that a packaging already pulled in is
        // folded, not an error.
        let mut expanded = Vec::new();
        for (position, uid) in declared.iter().enumerate() {
            if declared[..position].contains(uid) {
                return Err(RuleViolation::MalformedPayload(format!(
                    "asset '{uid}' declared twice in one transfer"
                )));
            }
            if !expanded.contains(uid) {
                expanded.push(uid.clone());
            }
            let asset = require_asset(&*state, uid)?;
            if let Some(packaging) = asset.as_packaging() {
                for product_uid in &packaging.products {
                    if !expanded.contains(product_uid) {
                        expanded.push(product_uid.clone());
                    }
                }
            }
        }

        for uid in &expanded {
            let mut asset = require_asset(&*state, uid)?;
            let kind = asset.kind();
            let base = asset.base_mut();
            if base.owner != ctx.signer() {
                return Err(RuleViolation::Unauthorized(format!(
                    "asset '{uid}' is not owned by the signer"
                )));
            }
            let previous = std::mem::replace(&mut base.owner, recipient.clone());
            base.previous_owners.push(previous.clone());
            base.transfer_logistics.push(logistics_uid.clone());
            store_asset(state, &asset)?;
            ctx.push_data(
                SCRATCH_TRANSFERRED_ASSETS,
                json!([uid, kind.as_str(), previous, recipient]),
            );
            ctx.note_target(uid);
        }
        let signer = ctx.signer().to_string();
        ctx.note_target(&signer);
        ctx.note_target(&recipient);
        debug!(assets = expanded.len(), recipient = %recipient, "ownership moved");
        Ok(())
    }
}

// =============================================================================
// PACKING
// =============================================================================

/// Couples a freshly created packaging to its contained products.
pub struct PackageProducts;

impl Listener for PackageProducts {
    fn name(&self) -> &'static str {
        "PackageProducts"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Sub(SubEventKind::PackagingCreated),
            0,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let packaging_uid = ctx.require_str("uid")?.to_string();
        let asset = require_asset(&*state, &packaging_uid)?;
        let packaging = asset.as_packaging().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{packaging_uid}' is not a packaging"))
        })?;
        if packaging.products.is_empty() {
            return Err(RuleViolation::MalformedPayload(
                "a packaging must contain at least one product".to_string(),
            ));
        }

        for product_uid in packaging.products.clone() {
            let mut product_asset = require_asset(&*state, &product_uid)?;
            let product = product_asset.as_product_mut().ok_or_else(|| {
                RuleViolation::InvariantViolation(format!(
                    "packaging '{packaging_uid}' may only contain products, got '{product_uid}'"
                ))
            })?;
            if product.base.owner != ctx.signer() {
                return Err(RuleViolation::Unauthorized(format!(
                    "product '{product_uid}' is not owned by the signer"
                )));
            }
            if let Some(existing) = &product.packaging {
                return Err(RuleViolation::InvariantViolation(format!(
                    "product '{product_uid}' is already packaged in '{existing}'"
                )));
            }
            product.packaging = Some(packaging_uid.clone());
            store_asset(state, &product_asset)?;
            ctx.note_target(&product_uid);
        }
        Ok(())
    }
}

// =============================================================================
// UNPACKING
// =============================================================================

/// Detaches one product from its packaging, restoring independent transfer.
pub struct UnpackProduct;

impl Listener for UnpackProduct {
    fn name(&self) -> &'static str {
        "UnpackProduct"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::ProductUnpacked),
            1000,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let product_uid = ctx.require_str("uid")?.to_string();
        let mut product_asset = require_asset(&*state, &product_uid)?;
        let product = product_asset.as_product_mut().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{product_uid}' is not a product"))
        })?;
        if product.base.owner != ctx.signer() {
            return Err(RuleViolation::Unauthorized(format!(
                "product '{product_uid}' is not owned by the signer"
            )));
        }
        let packaging_uid = product.packaging.take().ok_or_else(|| {
            RuleViolation::InvalidStateTransition(format!(
                "product '{product_uid}' is not packaged"
            ))
        })?;

        let mut packaging_asset = require_asset(&*state, &packaging_uid)?;
        let packaging = packaging_asset.as_packaging_mut().ok_or_else(|| {
            RuleViolation::InvariantViolation(format!(
                "product '{product_uid}' points at non-packaging '{packaging_uid}'"
            ))
        })?;
        remove_value(&mut packaging.products, &product_uid);

        store_asset(state, &product_asset)?;
        store_asset(state, &packaging_asset)?;
        ctx.note_target(&product_uid);
        ctx.note_target(&packaging_uid);
        Ok(())
    }
}
