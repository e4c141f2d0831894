//! Asset scenarios: the creation matrix, uid uniqueness, ownership lists,
//! indices, edits, deletion and authentication.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{Harness, ARTISAN, BUYER, ROOT, SUPPLIER};
    use cl_execution::prelude::*;
    use serde_json::json;

    #[test]
    fn test_supplier_creates_raw_material() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);

        let asset = harness.asset("rm-1");
        let material = asset.as_raw_material().expect("raw material");
        assert_eq!(material.supplier, SUPPLIER);
        assert_eq!(material.base.owner, SUPPLIER);
        assert_eq!(material.quantity, 100.0);

        // Ownership list and indices follow the creation.
        let supplier = harness.account(SUPPLIER);
        assert!(supplier.base().assets.contains(&"rm-1".to_string()));
        if let Account::Supplier(s) = &supplier {
            assert!(s.raw_materials_created.contains(&"rm-1".to_string()));
        }
        assert!(harness.owner_index(SUPPLIER).contains(&"rm-1".to_string()));
    }

    #[test]
    fn test_uid_collision_rejected() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        let violation = harness.rejected(
            "create/asset",
            json!({
                "asset_type": "raw_material",
                "uid": "rm-1",
                "material_type": "silk",
                "quantity": 10.0,
                "quantity_unit": "kg",
            }),
            SUPPLIER,
        );
        assert!(matches!(violation, RuleViolation::DuplicateEntity { kind: "asset", .. }));
    }

    #[test]
    fn test_creation_matrix_enforced() {
        let mut harness = Harness::with_marketplace();
        let violation = harness.rejected(
            "create/asset",
            json!({
                "asset_type": "raw_material",
                "uid": "rm-x",
                "material_type": "wool",
                "quantity": 10.0,
                "quantity_unit": "kg",
            }),
            BUYER,
        );
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }

    #[test]
    fn test_system_minted_kinds_cannot_be_declared() {
        let mut harness = Harness::with_marketplace();
        for kind in ["product", "logistics", "certification"] {
            let violation = harness.rejected(
                "create/asset",
                json!({"asset_type": kind, "uid": format!("{kind}-x")}),
                ARTISAN,
            );
            assert!(matches!(violation, RuleViolation::Unauthorized(_)), "{kind}");
        }
    }

    #[test]
    fn test_forbidden_asset_fields_rejected() {
        let mut harness = Harness::with_marketplace();
        let violation = harness.rejected(
            "create/asset",
            json!({
                "asset_type": "raw_material",
                "uid": "rm-x",
                "material_type": "wool",
                "quantity": 10.0,
                "quantity_unit": "kg",
                "history": [],
            }),
            SUPPLIER,
        );
        assert!(matches!(violation, RuleViolation::MalformedPayload(_)));
    }

    #[test]
    fn test_owner_edits_within_editable_fields() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        harness.ok(
            "edit/entity",
            json!({"target": "rm-1", "updates": {"unit_price": 3.5}}),
            SUPPLIER,
        );
        let asset = harness.asset("rm-1");
        assert_eq!(asset.as_raw_material().unwrap().unit_price, 3.5);
        let entry = asset.base().history.last().expect("edit recorded");
        let edits = entry.edits.as_ref().expect("deltas recorded");
        assert_eq!(edits["unit_price"].old, json!(2.0));
        assert_eq!(edits["unit_price"].new, json!(3.5));
    }

    #[test]
    fn test_edit_outside_editable_fields_rejected() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        let violation = harness.rejected(
            "edit/entity",
            json!({"target": "rm-1", "updates": {"quantity": 1000.0}}),
            SUPPLIER,
        );
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }

    #[test]
    fn test_deleting_an_asset_clears_its_indices() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        harness.ok(
            "delete/entity",
            json!({"target": "rm-1", "reason": "spoiled"}),
            SUPPLIER,
        );
        assert!(harness.asset("rm-1").base().is_deleted);
        assert!(!harness.owner_index(SUPPLIER).contains(&"rm-1".to_string()));
        // The owner's account stops listing it too.
        assert!(!harness
            .account(SUPPLIER)
            .base()
            .assets
            .contains(&"rm-1".to_string()));
        // The uid stays burned.
        let violation = harness.rejected(
            "create/asset",
            json!({
                "asset_type": "raw_material",
                "uid": "rm-1",
                "material_type": "wool",
                "quantity": 5.0,
                "quantity_unit": "kg",
            }),
            SUPPLIER,
        );
        assert!(matches!(violation, RuleViolation::DuplicateEntity { .. }));
    }

    #[test]
    fn test_authentication_decision_is_one_way() {
        let mut harness = Harness::with_marketplace();
        harness.ok(
            "create/admin",
            json!({
                "target_public_key": "pk-auth",
                "email": "auth@example.com",
                "permission_level": "authenticator",
            }),
            ROOT,
        );
        harness.ok(
            "authenticate/entity",
            json!({"target": ARTISAN, "decision": "approved"}),
            "pk-auth",
        );
        assert_eq!(
            harness.account(ARTISAN).base().authentication_status,
            AuthenticationStatus::Approved
        );
        let violation = harness.rejected(
            "authenticate/entity",
            json!({"target": ARTISAN, "decision": "rejected"}),
            "pk-auth",
        );
        assert!(matches!(violation, RuleViolation::InvalidStateTransition(_)));
    }

    #[test]
    fn test_authentication_requires_the_right_tier() {
        let mut harness = Harness::with_marketplace();
        harness.ok(
            "create/admin",
            json!({
                "target_public_key": "pk-mod",
                "email": "mod@example.com",
                "permission_level": "moderator",
            }),
            ROOT,
        );
        let violation = harness.rejected(
            "authenticate/entity",
            json!({"target": ARTISAN, "decision": "approved"}),
            "pk-mod",
        );
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }
}
