//! Cross-entity validators. They carry negative priorities and inspect the
//! staged result of the mutating handlers; a failure here rejects the whole
//! transaction and discards every staged write.

use crate::domain::context::EventContext;
use crate::dispatch::{Listener, Subscription, Trigger};
use crate::handlers::{require_account, require_asset};
use crate::handlers::workflow::resolve_completed_batch;
use crate::ports::LedgerState;
use shared_types::enums::{
    AccountKind, AdminLevel, AdminStatus, AssetKind, EventKind, SubAssignmentStatus, SubEventKind,
    WorkOrderStatus,
};
use shared_types::errors::RuleViolation;

// =============================================================================
// CREATION MATRIX
// =============================================================================

/// Checks the signer's account kind against the asset kind it declared.
pub struct ValidateCreatorAccount;

fn creation_allowed(account: AccountKind, asset: AssetKind) -> bool {
    match account {
        AccountKind::Supplier => matches!(asset, AssetKind::RawMaterial | AssetKind::WorkOrder),
        AccountKind::Artisan => matches!(
            asset,
            AssetKind::WorkOrder
                | AssetKind::ProductBatch
                | AssetKind::Packaging
                | AssetKind::SubAssignment
        ),
        AccountKind::Buyer => matches!(asset, AssetKind::WorkOrder),
        AccountKind::Admin => false,
    }
}

impl Listener for ValidateCreatorAccount {
    fn name(&self) -> &'static str {
        "ValidateCreatorAccount"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::AssetCreated),
            -100,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let account = require_account(&*state, ctx.signer())?;
        let uid = ctx.require_str("uid")?;
        let kind = require_asset(&*state, uid)?.kind();
        if !creation_allowed(account.kind(), kind) {
            return Err(RuleViolation::Unauthorized(format!(
                "a {:?} account cannot create {} assets",
                account.kind(),
                kind.as_str()
            )));
        }
        Ok(())
    }
}

// =============================================================================
// WORK-ORDER ASSIGNMENT
// =============================================================================

/// A new work order must point at an existing artisan other than its issuer.
pub struct ValidateAssigneeAccount;

impl Listener for ValidateAssigneeAccount {
    fn name(&self) -> &'static str {
        "ValidateAssigneeAccount"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Sub(SubEventKind::WorkOrderCreated),
            -100,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let uid = ctx.require_str("uid")?;
        let asset = require_asset(&*state, uid)?;
        let order = asset.as_work_order().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{uid}' is not a work order"))
        })?;
        if order.assignee == ctx.signer() {
            return Err(RuleViolation::InvariantViolation(
                "a work order cannot be assigned to its issuer".to_string(),
            ));
        }
        let assignee = require_account(&*state, &order.assignee)?;
        if assignee.kind() != AccountKind::Artisan {
            return Err(RuleViolation::Unauthorized(
                "work orders are assigned to artisans".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// ACCEPTANCE
// =============================================================================

/// Confirms the staged result of a work-order acceptance: the order is
/// accepted and linked to the batch the payload declared.
pub struct ValidateAcceptContext;

impl Listener for ValidateAcceptContext {
    fn name(&self) -> &'static str {
        "ValidateAcceptContext"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::WorkOrderAccepted),
            -100,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let uid = ctx.require_str("uid")?;
        let batch_uid = ctx.require_str("batch")?;
        let asset = require_asset(&*state, uid)?;
        let order = asset.as_work_order().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{uid}' is not a work order"))
        })?;
        if order.status != WorkOrderStatus::Accepted
            || order.batch.as_deref() != Some(batch_uid)
        {
            return Err(RuleViolation::InvariantViolation(format!(
                "acceptance of work order '{uid}' did not link batch '{batch_uid}'"
            )));
        }
        if order.assignee != ctx.signer() {
            return Err(RuleViolation::Unauthorized(format!(
                "only the assignee may accept work order '{uid}'"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// SUB-ASSIGNMENT CREATION
// =============================================================================

/// A new sub-assignment must hang off an in-progress batch owned by its
/// issuer, and point at an artisan other than the issuer.
pub struct ValidateSubAssignment;

impl Listener for ValidateSubAssignment {
    fn name(&self) -> &'static str {
        "ValidateSubAssignment"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Sub(SubEventKind::SubAssignmentCreated),
            -100,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let uid = ctx.require_str("uid")?;
        let asset = require_asset(&*state, uid)?;
        let assignment = asset.as_sub_assignment().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{uid}' is not a sub-assignment"))
        })?;
        if assignment.assignee == ctx.signer() {
            return Err(RuleViolation::InvariantViolation(
                "a sub-assignment cannot be assigned to its issuer".to_string(),
            ));
        }
        let assignee = require_account(&*state, &assignment.assignee)?;
        if assignee.kind() != AccountKind::Artisan {
            return Err(RuleViolation::Unauthorized(
                "sub-assignments are assigned to artisans".to_string(),
            ));
        }
        let batch_asset = require_asset(&*state, &assignment.batch)?;
        let batch = batch_asset.as_product_batch().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!(
                "asset '{}' is not a product batch",
                assignment.batch
            ))
        })?;
        if batch.base.owner != ctx.signer() {
            return Err(RuleViolation::Unauthorized(
                "sub-assignments are issued by the batch owner".to_string(),
            ));
        }
        if batch.status != shared_types::enums::BatchStatus::InProgress {
            return Err(RuleViolation::InvalidStateTransition(format!(
                "batch '{}' is not in progress",
                assignment.batch
            )));
        }
        Ok(())
    }
}

// =============================================================================
// RAW-MATERIAL BOUND
// =============================================================================

/// The cumulative quantity consumed from a raw material never exceeds its
/// declared quantity. Checked after the staged consumption is recorded.
pub struct ValidateRawMaterialAddition;

impl Listener for ValidateRawMaterialAddition {
    fn name(&self) -> &'static str {
        "ValidateRawMaterialAddition"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::AddRawMaterial),
            -100,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let material_uid = ctx.require_str("raw_material")?;
        let asset = require_asset(&*state, material_uid)?;
        let material = asset.as_raw_material().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!(
                "asset '{material_uid}' is not a raw material"
            ))
        })?;
        let used: f64 = material.batches_used_in.iter().map(|u| u.quantity).sum();
        if used > material.quantity {
            return Err(RuleViolation::InvariantViolation(format!(
                "raw material '{material_uid}' would be overdrawn: {used} of {} {}",
                material.quantity, material.quantity_unit
            )));
        }
        Ok(())
    }
}

// =============================================================================
// BATCH COMPLETION GATE
// =============================================================================

/// A batch may only complete with a positive produced unit count and with
/// every linked sub-assignment settled (rejected or completed). A batch
/// derived from a work order completes through that order alone.
pub struct ValidateBatchCompletion;

impl Listener for ValidateBatchCompletion {
    fn name(&self) -> &'static str {
        "ValidateBatchCompletion"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::WorkOrderCompleted), -100),
            Subscription::new(Trigger::Event(EventKind::BatchCompleted), -100),
        ]
    }

    fn on_event(
        &self,
        trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let batch_uid = resolve_completed_batch(ctx, &*state)?;
        let asset = require_asset(&*state, &batch_uid)?;
        let batch = asset.as_product_batch().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{batch_uid}' is not a product batch"))
        })?;
        if trigger == Trigger::Event(EventKind::BatchCompleted) && batch.work_order.is_some() {
            return Err(RuleViolation::InvalidStateTransition(format!(
                "batch '{batch_uid}' completes through its work order"
            )));
        }
        if batch.base.owner != ctx.signer() {
            return Err(RuleViolation::Unauthorized(format!(
                "only the owner may complete batch '{batch_uid}'"
            )));
        }
        match batch.units_produced {
            Some(units) if units > 0 => {}
            _ => {
                return Err(RuleViolation::InvariantViolation(format!(
                    "batch '{batch_uid}' must report a positive produced unit count"
                )))
            }
        }
        for assignment_uid in &batch.sub_assignments {
            let assignment_asset = require_asset(&*state, assignment_uid)?;
            let assignment = assignment_asset.as_sub_assignment().ok_or_else(|| {
                RuleViolation::InvariantViolation(format!(
                    "batch '{batch_uid}' links non-sub-assignment '{assignment_uid}'"
                ))
            })?;
            if matches!(
                assignment.status,
                SubAssignmentStatus::Pending | SubAssignmentStatus::Accepted
            ) {
                return Err(RuleViolation::InvalidStateTransition(format!(
                    "sub-assignment '{assignment_uid}' is still open"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TRANSFERABILITY
// =============================================================================

/// Kind-level and coupling rules for transfers, checked against the staged
/// post-transfer state.
pub struct ValidateTransfer;

impl Listener for ValidateTransfer {
    fn name(&self) -> &'static str {
        "ValidateTransfer"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::AssetsTransferred),
            -200,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let recipient = ctx.require_str("recipient")?;
        if recipient == ctx.signer() {
            return Err(RuleViolation::InvariantViolation(
                "an asset cannot be transferred to its current owner".to_string(),
            ));
        }
        require_account(&*state, recipient)?;

        let declared = ctx.require_str_list("assets")?;
        for uid in &declared {
            let asset = require_asset(&*state, uid)?;
            match asset.kind() {
                AssetKind::WorkOrder
                | AssetKind::ProductBatch
                | AssetKind::SubAssignment
                | AssetKind::Logistics
                | AssetKind::Certification => {
                    return Err(RuleViolation::InvariantViolation(format!(
                        "{} assets are non-transferable",
                        asset.kind().as_str()
                    )));
                }
                _ => {}
            }
            if let Some(material) = asset.as_raw_material() {
                if material.processor.is_some() {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "raw material '{uid}' is locked after processing"
                    )));
                }
            }
            if let Some(product) = asset.as_product() {
                if let Some(packaging_uid) = &product.packaging {
                    if !declared.contains(packaging_uid) {
                        return Err(RuleViolation::InvariantViolation(format!(
                            "product '{uid}' moves only with its packaging"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// ADMIN CAPABILITY MATRIX
// =============================================================================

/// Admin-gated events require an active admin signer of the right tier. The
/// super admin passes every gate.
pub struct ValidateAdminAccount;

fn required_level(event: EventKind) -> Option<AdminLevel> {
    match event {
        EventKind::AdminCreated => Some(AdminLevel::SuperAdmin),
        EventKind::CertificationIssued => Some(AdminLevel::Certifier),
        EventKind::ModeratorEdited => Some(AdminLevel::Moderator),
        EventKind::EntityAuthenticated => Some(AdminLevel::Authenticator),
        _ => None,
    }
}

impl Listener for ValidateAdminAccount {
    fn name(&self) -> &'static str {
        "ValidateAdminAccount"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::AdminCreated), -1000),
            Subscription::new(Trigger::Event(EventKind::CertificationIssued), -1000),
            Subscription::new(Trigger::Event(EventKind::ModeratorEdited), -1000),
            Subscription::new(Trigger::Event(EventKind::EntityAuthenticated), -1000),
        ]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let account = require_account(&*state, ctx.signer())?;
        let admin = account.as_admin().ok_or_else(|| {
            RuleViolation::Unauthorized("this event requires an admin signer".to_string())
        })?;
        if admin.status != AdminStatus::Active {
            return Err(RuleViolation::Unauthorized(
                "the signing admin is not active".to_string(),
            ));
        }
        if let Some(required) = required_level(ctx.event()) {
            let permitted = admin.permission_level == required
                || admin.permission_level == AdminLevel::SuperAdmin;
            if !permitted {
                return Err(RuleViolation::Unauthorized(format!(
                    "event '{}' requires {required:?} permission",
                    ctx.event()
                )));
            }
        }
        Ok(())
    }
}
