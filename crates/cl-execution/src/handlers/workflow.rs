//! Workflow handlers: work-order lifecycle, sub-assignments, batch progress
//! and raw-material consumption.

use crate::domain::context::EventContext;
use crate::dispatch::{Listener, Subscription, Trigger};
use crate::handlers::{push_unique, require_account, require_asset, store_account, store_asset};
use crate::ports::LedgerState;
use shared_types::accounts::Account;
use shared_types::assets::UsageRecord;
use shared_types::enums::{
    BatchStatus, EventKind, SubAssignmentStatus, SubEventKind, WorkOrderStatus,
};
use shared_types::errors::RuleViolation;

/// The batch a completion event refers to: directly for `complete/batch`,
/// through the work order's link for `complete/work_order`.
pub fn resolve_completed_batch(
    ctx: &EventContext,
    state: &dyn LedgerState,
) -> Result<String, RuleViolation> {
    let uid = ctx.require_str("uid")?;
    match ctx.event() {
        EventKind::BatchCompleted => Ok(uid.to_string()),
        EventKind::WorkOrderCompleted => {
            let asset = require_asset(state, uid)?;
            let order = asset.as_work_order().ok_or_else(|| {
                RuleViolation::MalformedPayload(format!("asset '{uid}' is not a work order"))
            })?;
            order.batch.clone().ok_or_else(|| {
                RuleViolation::InvariantViolation(format!(
                    "work order '{uid}' has no linked batch"
                ))
            })
        }
        other => Err(RuleViolation::InvariantViolation(format!(
            "event '{other}' does not complete a batch"
        ))),
    }
}

// =============================================================================
// WORK-ORDER LIFECYCLE
// =============================================================================

/// Drives the work-order status machine and the assignee's per-transition
/// lists.
pub struct WorkOrderProgress;

impl Listener for WorkOrderProgress {
    fn name(&self) -> &'static str {
        "WorkOrderProgress"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::WorkOrderAccepted), 1000),
            Subscription::new(Trigger::Event(EventKind::WorkOrderRejected), 1000),
            Subscription::new(Trigger::Event(EventKind::WorkOrderCompleted), 1000),
        ]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let uid = ctx.require_str("uid")?.to_string();
        let mut asset = require_asset(&*state, &uid)?;
        let order = asset.as_work_order_mut().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{uid}' is not a work order"))
        })?;
        if order.assignee != ctx.signer() {
            return Err(RuleViolation::Unauthorized(format!(
                "only the assignee may progress work order '{uid}'"
            )));
        }

        let mut assignee = require_account(&*state, ctx.signer())?;
        let artisan = assignee.as_artisan_mut().ok_or_else(|| {
            RuleViolation::Unauthorized("work orders are progressed by artisans".to_string())
        })?;

        match ctx.event() {
            EventKind::WorkOrderAccepted => {
                if order.status != WorkOrderStatus::Pending {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "work order '{uid}' is not pending"
                    )));
                }
                order.status = WorkOrderStatus::Accepted;
                order.batch = Some(ctx.require_str("batch")?.to_string());
                push_unique(&mut artisan.work_orders_accepted, &uid);
            }
            EventKind::WorkOrderRejected => {
                if order.status != WorkOrderStatus::Pending {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "work order '{uid}' is not pending"
                    )));
                }
                order.status = WorkOrderStatus::Rejected;
                order.rejection_reason = Some(ctx.require_str("reason")?.to_string());
                push_unique(&mut artisan.work_orders_rejected, &uid);
            }
            EventKind::WorkOrderCompleted => {
                if order.status != WorkOrderStatus::Accepted {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "work order '{uid}' is not accepted"
                    )));
                }
                order.status = WorkOrderStatus::Completed;
                order.completion_date = ctx.timestamp().to_string();
                push_unique(&mut artisan.work_orders_completed, &uid);
            }
            _ => {}
        }

        let signer = ctx.signer().to_string();
        store_asset(state, &asset)?;
        store_account(state, &assignee)?;
        ctx.note_target(&uid);
        ctx.note_target(&signer);
        Ok(())
    }
}

// =============================================================================
// ASSIGNMENT BOOKKEEPING
// =============================================================================

/// Records a freshly created work order on both sides: the issuer's
/// `work_orders_issued` and the assignee's `work_orders_assigned`.
pub struct AssigneeUpdater;

impl Listener for AssigneeUpdater {
    fn name(&self) -> &'static str {
        "AssigneeUpdater"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Sub(SubEventKind::WorkOrderCreated),
            0,
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
        let order = asset.as_work_order().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{uid}' is not a work order"))
        })?;

        let mut issuer = require_account(&*state, &order.assigner)?;
        push_unique(&mut issuer.base_mut().work_orders_issued, &uid);

        let mut assignee = require_account(&*state, &order.assignee)?;
        let artisan = assignee.as_artisan_mut().ok_or_else(|| {
            RuleViolation::Unauthorized("work orders are assigned to artisans".to_string())
        })?;
        push_unique(&mut artisan.work_orders_assigned, &uid);

        let issuer_key = issuer.public_key().to_string();
        let assignee_key = assignee.public_key().to_string();
        store_account(state, &issuer)?;
        store_account(state, &assignee)?;
        ctx.note_target(&issuer_key);
        ctx.note_target(&assignee_key);
        Ok(())
    }
}

// =============================================================================
// SUB-ASSIGNMENT LIFECYCLE
// =============================================================================

/// Links new sub-assignments to their batch and assignee, then drives the
/// status machine through accept, reject, complete and paid.
pub struct SubAssignmentProgress;

impl SubAssignmentProgress {
    fn on_created(ctx: &mut EventContext, state: &mut dyn LedgerState) -> Result<(), RuleViolation> {
        let uid = ctx.require_str("uid")?.to_string();
        let asset = require_asset(&*state, &uid)?;
        let assignment = asset.as_sub_assignment().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{uid}' is not a sub-assignment"))
        })?;

        let batch_uid = assignment.batch.clone();
        let mut batch_asset = require_asset(&*state, &batch_uid)?;
        let batch = batch_asset.as_product_batch_mut().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{batch_uid}' is not a product batch"))
        })?;
        push_unique(&mut batch.sub_assignments, &uid);

        let mut assignee = require_account(&*state, &assignment.assignee)?;
        let artisan = assignee.as_artisan_mut().ok_or_else(|| {
            RuleViolation::Unauthorized("sub-assignments are assigned to artisans".to_string())
        })?;
        push_unique(&mut artisan.sub_assignments, &uid);

        let assignee_key = assignee.public_key().to_string();
        store_asset(state, &batch_asset)?;
        store_account(state, &assignee)?;
        ctx.note_target(&batch_uid);
        ctx.note_target(&assignee_key);
        Ok(())
    }

    fn on_transition(
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let uid = ctx.require_str("uid")?.to_string();
        let mut asset = require_asset(&*state, &uid)?;
        let assignment = asset.as_sub_assignment_mut().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{uid}' is not a sub-assignment"))
        })?;

        let mut touched_account: Option<Account> = None;
        match ctx.event() {
            EventKind::SubAssignmentAccepted => {
                require_assignee(assignment.assignee.as_str(), ctx, &uid)?;
                if assignment.status != SubAssignmentStatus::Pending {
                    return Err(pending_only(&uid));
                }
                assignment.status = SubAssignmentStatus::Accepted;
                let mut account = require_account(&*state, ctx.signer())?;
                if let Some(artisan) = account.as_artisan_mut() {
                    push_unique(&mut artisan.sub_assignments_accepted, &uid);
                }
                touched_account = Some(account);
            }
            EventKind::SubAssignmentRejected => {
                require_assignee(assignment.assignee.as_str(), ctx, &uid)?;
                if assignment.status != SubAssignmentStatus::Pending {
                    return Err(pending_only(&uid));
                }
                assignment.status = SubAssignmentStatus::Rejected;
                assignment.rejection_reason = Some(ctx.require_str("reason")?.to_string());
                let mut account = require_account(&*state, ctx.signer())?;
                if let Some(artisan) = account.as_artisan_mut() {
                    push_unique(&mut artisan.sub_assignments_rejected, &uid);
                }
                touched_account = Some(account);
            }
            EventKind::SubAssignmentCompleted => {
                require_assignee(assignment.assignee.as_str(), ctx, &uid)?;
                if assignment.status != SubAssignmentStatus::Accepted {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "sub-assignment '{uid}' is not accepted"
                    )));
                }
                assignment.status = SubAssignmentStatus::Completed;
            }
            EventKind::SubAssignmentPaid => {
                if assignment.assigner != ctx.signer() {
                    return Err(RuleViolation::Unauthorized(format!(
                        "only the assigner may mark sub-assignment '{uid}' paid"
                    )));
                }
                if assignment.status != SubAssignmentStatus::Completed {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "sub-assignment '{uid}' is not completed"
                    )));
                }
                if assignment.is_paid {
                    return Err(RuleViolation::InvalidStateTransition(format!(
                        "sub-assignment '{uid}' is already paid"
                    )));
                }
                assignment.is_paid = true;
            }
            _ => {}
        }

        store_asset(state, &asset)?;
        if let Some(account) = touched_account {
            let key = account.public_key().to_string();
            store_account(state, &account)?;
            ctx.note_target(&key);
        }
        ctx.note_target(&uid);
        Ok(())
    }
}

fn require_assignee(assignee: &str, ctx: &EventContext, uid: &str) -> Result<(), RuleViolation> {
    if assignee != ctx.signer() {
        return Err(RuleViolation::Unauthorized(format!(
            "only the assignee may progress sub-assignment '{uid}'"
        )));
    }
    Ok(())
}

fn pending_only(uid: &str) -> RuleViolation {
    RuleViolation::InvalidStateTransition(format!("sub-assignment '{uid}' is not pending"))
}

impl Listener for SubAssignmentProgress {
    fn name(&self) -> &'static str {
        "SubAssignmentProgress"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Sub(SubEventKind::SubAssignmentCreated), 0),
            Subscription::new(Trigger::Event(EventKind::SubAssignmentAccepted), 1000),
            Subscription::new(Trigger::Event(EventKind::SubAssignmentRejected), 1000),
            Subscription::new(Trigger::Event(EventKind::SubAssignmentCompleted), 1000),
            Subscription::new(Trigger::Event(EventKind::SubAssignmentPaid), 1000),
        ]
    }

    fn on_event(
        &self,
        trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        match trigger {
            Trigger::Sub(SubEventKind::SubAssignmentCreated) => Self::on_created(ctx, state),
            Trigger::Event(_) => Self::on_transition(ctx, state),
            Trigger::Sub(_) => Ok(()),
        }
    }
}

// =============================================================================
// RAW-MATERIAL CONSUMPTION
// =============================================================================

/// Records a raw-material consumption on both the batch and the material,
/// locking the material to its first processor.
pub struct AddToBatch;

impl Listener for AddToBatch {
    fn name(&self) -> &'static str {
        "AddToBatch"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(
            Trigger::Event(EventKind::AddRawMaterial),
            100,
        )]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let batch_uid = ctx.require_str("batch")?.to_string();
        let material_uid = ctx.require_str("raw_material")?.to_string();
        let quantity = ctx.require_f64("quantity")?;
        if quantity <= 0.0 {
            return Err(RuleViolation::MalformedPayload(
                "consumed quantity must be positive".to_string(),
            ));
        }

        let mut batch_asset = require_asset(&*state, &batch_uid)?;
        let batch = batch_asset.as_product_batch_mut().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{batch_uid}' is not a product batch"))
        })?;
        if batch.base.owner != ctx.signer() {
            return Err(RuleViolation::Unauthorized(format!(
                "only the owner may add materials to batch '{batch_uid}'"
            )));
        }
        if batch.status != BatchStatus::InProgress {
            return Err(RuleViolation::InvalidStateTransition(format!(
                "batch '{batch_uid}' is not in progress"
            )));
        }

        let mut material_asset = require_asset(&*state, &material_uid)?;
        let material = material_asset.as_raw_material_mut().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{material_uid}' is not a raw material"))
        })?;
        if material.base.owner != ctx.signer() {
            return Err(RuleViolation::Unauthorized(format!(
                "raw material '{material_uid}' is not owned by the signer"
            )));
        }
        match &material.processor {
            None => material.processor = Some(ctx.signer().to_string()),
            Some(processor) if processor != ctx.signer() => {
                return Err(RuleViolation::Unauthorized(format!(
                    "raw material '{material_uid}' is locked to another processor"
                )));
            }
            Some(_) => {}
        }

        let usage = UsageRecord {
            batch: batch_uid.clone(),
            raw_material: material_uid.clone(),
            quantity,
        };
        batch.raw_materials.push(usage.clone());
        material.batches_used_in.push(usage);

        store_asset(state, &batch_asset)?;
        store_asset(state, &material_asset)?;
        ctx.note_target(&batch_uid);
        ctx.note_target(&material_uid);
        Ok(())
    }
}

// =============================================================================
// BATCH COMPLETION
// =============================================================================

/// Moves a batch to completed, recording the produced unit count and the
/// production date. One-way.
pub struct BatchUpdater;

impl Listener for BatchUpdater {
    fn name(&self) -> &'static str {
        "BatchUpdater"
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![
            Subscription::new(Trigger::Event(EventKind::WorkOrderCompleted), 0),
            Subscription::new(Trigger::Event(EventKind::BatchCompleted), 0),
        ]
    }

    fn on_event(
        &self,
        _trigger: Trigger,
        ctx: &mut EventContext,
        state: &mut dyn LedgerState,
    ) -> Result<(), RuleViolation> {
        let batch_uid = resolve_completed_batch(ctx, &*state)?;
        let mut asset = require_asset(&*state, &batch_uid)?;
        let batch = asset.as_product_batch_mut().ok_or_else(|| {
            RuleViolation::MalformedPayload(format!("asset '{batch_uid}' is not a product batch"))
        })?;
        if batch.base.owner != ctx.signer() {
            return Err(RuleViolation::Unauthorized(format!(
                "only the owner may complete batch '{batch_uid}'"
            )));
        }
        if batch.status != BatchStatus::InProgress {
            return Err(RuleViolation::InvalidStateTransition(format!(
                "batch '{batch_uid}' is not in progress"
            )));
        }
        batch.status = BatchStatus::Completed;
        batch.units_produced = Some(ctx.require_u64("units_produced")?);
        batch.production_date = ctx.timestamp().to_string();

        store_asset(state, &asset)?;
        ctx.note_target(&batch_uid);
        Ok(())
    }
}
