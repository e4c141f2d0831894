//! Production workflow scenarios: work orders, derived batches, raw-material
//! consumption, sub-assignments and product minting.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{Harness, ARTISAN, ARTISAN2, SUPPLIER};
    use cl_execution::prelude::*;
    use serde_json::json;

    /// Marketplace with a raw material already in the artisan's hands and an
    /// accepted work order with its derived batch.
    fn production_setup() -> Harness {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        harness.transfer(&["rm-1"], SUPPLIER, ARTISAN, "log-1");
        harness.issue_work_order("wo-1", 10);
        harness.accept_work_order("wo-1", "b-1");
        harness
    }

    #[test]
    fn test_acceptance_derives_the_batch() {
        let harness = production_setup();

        let order_asset = harness.asset("wo-1");
        let order = order_asset.as_work_order().expect("work order");
        assert_eq!(order.status, WorkOrderStatus::Accepted);
        assert_eq!(order.batch.as_deref(), Some("b-1"));

        let batch_asset = harness.asset("b-1");
        let batch = batch_asset.as_product_batch().expect("product batch");
        assert_eq!(batch.producer, ARTISAN);
        assert_eq!(batch.status, BatchStatus::InProgress);
        assert_eq!(batch.quantity, 10.0);
        assert_eq!(batch.work_order.as_deref(), Some("wo-1"));

        let account = harness.account(ARTISAN);
        let artisan = account.as_artisan().expect("artisan");
        assert!(artisan.work_orders_assigned.contains(&"wo-1".to_string()));
        assert!(artisan.work_orders_accepted.contains(&"wo-1".to_string()));
        assert!(account.base().assets.contains(&"b-1".to_string()));
    }

    #[test]
    fn test_derived_batch_records_its_creation() {
        let harness = production_setup();
        let asset = harness.asset("b-1");
        let history = &asset.base().history;
        assert!(!history.is_empty());
        assert_eq!(history[0].event, "accept/work_order");
        assert_eq!(history[0].actor, ARTISAN);
    }

    #[test]
    fn test_only_the_assignee_may_accept() {
        let mut harness = Harness::with_marketplace();
        harness.issue_work_order("wo-1", 10);
        let violation = harness.rejected(
            "accept/work_order",
            json!({"uid": "wo-1", "batch": "b-1"}),
            ARTISAN2,
        );
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }

    #[test]
    fn test_work_order_status_is_monotone() {
        let mut harness = production_setup();
        // Accepting twice walks the machine backwards.
        let violation = harness.rejected(
            "accept/work_order",
            json!({"uid": "wo-1", "batch": "b-2"}),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvalidStateTransition(_)));
        let violation = harness.rejected(
            "reject/work_order",
            json!({"uid": "wo-1", "reason": "changed my mind"}),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvalidStateTransition(_)));
    }

    #[test]
    fn test_rejection_records_the_reason() {
        let mut harness = Harness::with_marketplace();
        harness.issue_work_order("wo-1", 10);
        harness.ok(
            "reject/work_order",
            json!({"uid": "wo-1", "reason": "fully booked"}),
            ARTISAN,
        );
        let asset = harness.asset("wo-1");
        let order = asset.as_work_order().unwrap();
        assert_eq!(order.status, WorkOrderStatus::Rejected);
        assert_eq!(order.rejection_reason.as_deref(), Some("fully booked"));
    }

    #[test]
    fn test_raw_material_consumption_is_bounded() {
        let mut harness = production_setup();
        harness.ok(
            "add/raw_material",
            json!({"batch": "b-1", "raw_material": "rm-1", "quantity": 40.0}),
            ARTISAN,
        );
        // 40 + 70 overshoots the declared 100.
        let violation = harness.rejected(
            "add/raw_material",
            json!({"batch": "b-1", "raw_material": "rm-1", "quantity": 70.0}),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
        // The rejected consumption left no trace.
        let asset = harness.asset("rm-1");
        let material = asset.as_raw_material().unwrap();
        assert_eq!(material.batches_used_in.len(), 1);
        assert_eq!(material.remaining_quantity(), 60.0);
        assert_eq!(material.processor.as_deref(), Some(ARTISAN));
        // A second draw within bounds still fits.
        harness.ok(
            "add/raw_material",
            json!({"batch": "b-1", "raw_material": "rm-1", "quantity": 60.0}),
            ARTISAN,
        );
    }

    #[test]
    fn test_foreign_material_cannot_be_consumed() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-owned-by-supplier", 50.0);
        harness.issue_work_order("wo-1", 10);
        harness.accept_work_order("wo-1", "b-1");
        let violation = harness.rejected(
            "add/raw_material",
            json!({"batch": "b-1", "raw_material": "rm-owned-by-supplier", "quantity": 10.0}),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }

    #[test]
    fn test_sub_assignment_lifecycle() {
        let mut harness = production_setup();
        harness.ok(
            "create/asset",
            json!({
                "asset_type": "sub_assignment",
                "uid": "sa-1",
                "batch": "b-1",
                "assignee": ARTISAN2,
                "pay": 500.0,
                "task_description": "knit 5 shawls",
            }),
            ARTISAN,
        );
        let batch_asset = harness.asset("b-1");
        assert!(batch_asset
            .as_product_batch()
            .unwrap()
            .sub_assignments
            .contains(&"sa-1".to_string()));

        harness.ok("accept/sub_assignment", json!({"uid": "sa-1"}), ARTISAN2);
        harness.ok("complete/sub_assignment", json!({"uid": "sa-1"}), ARTISAN2);
        harness.ok("paid/sub_assignment", json!({"uid": "sa-1"}), ARTISAN);

        let asset = harness.asset("sa-1");
        let assignment = asset.as_sub_assignment().unwrap();
        assert_eq!(assignment.status, SubAssignmentStatus::Completed);
        assert!(assignment.is_paid);

        // Paying twice is a dead end.
        let violation = harness.rejected("paid/sub_assignment", json!({"uid": "sa-1"}), ARTISAN);
        assert!(matches!(violation, RuleViolation::InvalidStateTransition(_)));
    }

    #[test]
    fn test_only_the_assigner_marks_paid() {
        let mut harness = production_setup();
        harness.ok(
            "create/asset",
            json!({
                "asset_type": "sub_assignment",
                "uid": "sa-1",
                "batch": "b-1",
                "assignee": ARTISAN2,
                "pay": 500.0,
                "task_description": "knit 5 shawls",
            }),
            ARTISAN,
        );
        harness.ok("accept/sub_assignment", json!({"uid": "sa-1"}), ARTISAN2);
        harness.ok("complete/sub_assignment", json!({"uid": "sa-1"}), ARTISAN2);
        let violation = harness.rejected("paid/sub_assignment", json!({"uid": "sa-1"}), ARTISAN2);
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }

    #[test]
    fn test_completion_blocked_while_sub_assignments_open() {
        let mut harness = production_setup();
        harness.ok(
            "create/asset",
            json!({
                "asset_type": "sub_assignment",
                "uid": "sa-1",
                "batch": "b-1",
                "assignee": ARTISAN2,
                "pay": 500.0,
                "task_description": "knit 5 shawls",
            }),
            ARTISAN,
        );
        let violation = harness.rejected(
            "complete/work_order",
            json!({"uid": "wo-1", "units_produced": 10}),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvalidStateTransition(_)));

        // A rejected sub-assignment unblocks the batch.
        harness.ok(
            "reject/sub_assignment",
            json!({"uid": "sa-1", "reason": "no capacity"}),
            ARTISAN2,
        );
        harness.ok(
            "complete/work_order",
            json!({"uid": "wo-1", "units_produced": 10}),
            ARTISAN,
        );
    }

    #[test]
    fn test_completion_mints_one_product_per_unit() {
        let mut harness = production_setup();
        harness.ok(
            "complete/work_order",
            json!({"uid": "wo-1", "units_produced": 3, "unit_price": 450.0}),
            ARTISAN,
        );

        let order_asset = harness.asset("wo-1");
        assert_eq!(order_asset.as_work_order().unwrap().status, WorkOrderStatus::Completed);
        let batch_asset = harness.asset("b-1");
        let batch = batch_asset.as_product_batch().unwrap();
        assert_eq!(batch.status, BatchStatus::Completed);
        assert_eq!(batch.units_produced, Some(3));

        for serial in 1..=3u64 {
            let uid = format!("b-1-{serial}");
            let asset = harness.asset(&uid);
            let product = asset.as_product().expect("product");
            assert_eq!(product.batch, "b-1");
            assert_eq!(product.serial_no, serial);
            assert_eq!(product.price, 450.0);
            assert_eq!(product.base.owner, ARTISAN);
            assert!(harness.owner_index(ARTISAN).contains(&uid));
        }
    }

    #[test]
    fn test_completion_requires_positive_units() {
        let mut harness = production_setup();
        let violation = harness.rejected(
            "complete/work_order",
            json!({"uid": "wo-1", "units_produced": 0}),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
    }

    #[test]
    fn test_linked_batch_completes_only_through_its_order() {
        let mut harness = production_setup();
        let violation = harness.rejected(
            "complete/batch",
            json!({"uid": "b-1", "units_produced": 10}),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvalidStateTransition(_)));
        // The order path stays open.
        harness.ok(
            "complete/work_order",
            json!({"uid": "wo-1", "units_produced": 10}),
            ARTISAN,
        );
    }

    #[test]
    fn test_standalone_batch_completes_directly() {
        let mut harness = Harness::with_marketplace();
        harness.ok(
            "create/asset",
            json!({
                "asset_type": "product_batch",
                "uid": "b-solo",
                "quantity": 2.0,
                "unit": "pieces",
                "product_description": "carved walnut boxes",
            }),
            ARTISAN,
        );
        harness.ok(
            "complete/batch",
            json!({"uid": "b-solo", "units_produced": 2}),
            ARTISAN,
        );
        let asset = harness.asset("b-solo");
        assert_eq!(asset.as_product_batch().unwrap().status, BatchStatus::Completed);
        assert!(harness.asset("b-solo-1").as_product().is_some());
        assert!(harness.asset("b-solo-2").as_product().is_some());

        // Completion is one-way.
        let violation = harness.rejected(
            "complete/batch",
            json!({"uid": "b-solo", "units_produced": 5}),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvalidStateTransition(_)));
    }

    #[test]
    fn test_issuer_cannot_assign_to_self() {
        let mut harness = Harness::with_marketplace();
        let violation = harness.rejected(
            "create/asset",
            json!({
                "asset_type": "work_order",
                "uid": "wo-self",
                "assignee": ARTISAN,
                "order_quantity": 1,
                "quantity_unit": "pieces",
                "total_price": 10.0,
            }),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
    }

    #[test]
    fn test_work_order_history_tracks_the_lifecycle() {
        let mut harness = production_setup();
        harness.ok(
            "complete/work_order",
            json!({"uid": "wo-1", "units_produced": 1}),
            ARTISAN,
        );
        let asset = harness.asset("wo-1");
        let events: Vec<&str> = asset
            .base()
            .history
            .iter()
            .map(|entry| entry.event.as_str())
            .collect();
        assert!(events.contains(&"accept/work_order"));
        assert!(events.contains(&"complete/work_order"));
    }
}
