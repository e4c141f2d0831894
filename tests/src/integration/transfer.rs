//! Transfer scenarios: ownership movement, derived logistics records,
//! transferability rules and packaging coupling.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{Harness, ARTISAN, BUYER, SUPPLIER};
    use cl_execution::prelude::*;
    use serde_json::json;

    /// Marketplace where the artisan holds two minted products.
    fn with_products() -> Harness {
        let mut harness = Harness::with_marketplace();
        harness.ok(
            "create/asset",
            json!({
                "asset_type": "product_batch",
                "uid": "b-1",
                "quantity": 2.0,
                "unit": "pieces",
                "product_description": "pashmina shawls",
            }),
            ARTISAN,
        );
        harness.ok(
            "complete/batch",
            json!({"uid": "b-1", "units_produced": 2}),
            ARTISAN,
        );
        harness
    }

    fn package(harness: &mut Harness, uid: &str, products: &[&str]) {
        harness.ok(
            "create/asset",
            json!({
                "asset_type": "packaging",
                "uid": uid,
                "products": products,
                "package_type": "wooden crate",
                "seal_id": "seal-9",
            }),
            ARTISAN,
        );
    }

    #[test]
    fn test_transfer_moves_ownership_and_mints_logistics() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        harness.transfer(&["rm-1"], SUPPLIER, ARTISAN, "log-1");

        let asset = harness.asset("rm-1");
        let base = asset.base();
        assert_eq!(base.owner, ARTISAN);
        assert_eq!(base.previous_owners, vec![SUPPLIER.to_string()]);
        assert_eq!(base.transfer_logistics, vec!["log-1".to_string()]);

        let logistics_asset = harness.asset("log-1");
        let logistics = logistics_asset.as_logistics().expect("logistics");
        assert_eq!(logistics.assets, vec!["rm-1".to_string()]);
        assert_eq!(logistics.recipient, ARTISAN);
        assert_eq!(logistics.carrier, "Valley Freight");
        assert!(!logistics.transaction.is_empty());
        // The derived record carries its own creation entry.
        assert_eq!(logistics.base.history.len(), 1);
        assert_eq!(logistics.base.history[0].event, "transfer/asset");

        // Ownership lists and indices follow the move.
        assert!(!harness.owner_index(SUPPLIER).contains(&"rm-1".to_string()));
        assert!(harness.owner_index(ARTISAN).contains(&"rm-1".to_string()));
        let supplier = harness.account(SUPPLIER);
        assert!(!supplier.base().assets.contains(&"rm-1".to_string()));
        if let Account::Supplier(s) = &supplier {
            assert!(s.raw_materials_supplied.contains(&"rm-1".to_string()));
        }
        assert!(harness
            .account(ARTISAN)
            .base()
            .assets
            .contains(&"rm-1".to_string()));
    }

    #[test]
    fn test_transfer_requires_ownership() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        let violation = harness.rejected(
            "transfer/asset",
            json!({
                "assets": ["rm-1"],
                "recipient": BUYER,
                "logistics": {
                    "uid": "log-x",
                    "carrier": "Valley Freight",
                    "origin": "Srinagar",
                    "destination": "Delhi",
                    "dispatch_date": "2024-01-02",
                },
            }),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }

    #[test]
    fn test_transfer_to_self_rejected() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        let violation = harness.rejected(
            "transfer/asset",
            json!({
                "assets": ["rm-1"],
                "recipient": SUPPLIER,
                "logistics": {
                    "uid": "log-x",
                    "carrier": "Valley Freight",
                    "origin": "Srinagar",
                    "destination": "Srinagar",
                    "dispatch_date": "2024-01-02",
                },
            }),
            SUPPLIER,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
    }

    #[test]
    fn test_non_transferable_kinds_rejected() {
        let mut harness = Harness::with_marketplace();
        harness.issue_work_order("wo-1", 10);
        let violation = harness.rejected(
            "transfer/asset",
            json!({
                "assets": ["wo-1"],
                "recipient": SUPPLIER,
                "logistics": {
                    "uid": "log-x",
                    "carrier": "Valley Freight",
                    "origin": "Delhi",
                    "destination": "Srinagar",
                    "dispatch_date": "2024-01-02",
                },
            }),
            BUYER,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
    }

    #[test]
    fn test_batches_are_non_transferable() {
        let mut harness = with_products();
        let violation = harness.rejected(
            "transfer/asset",
            json!({
                "assets": ["b-1"],
                "recipient": BUYER,
                "logistics": {
                    "uid": "log-x",
                    "carrier": "Valley Freight",
                    "origin": "Srinagar",
                    "destination": "Delhi",
                    "dispatch_date": "2024-01-02",
                },
            }),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
        assert_eq!(harness.asset("b-1").base().owner, ARTISAN);
    }

    #[test]
    fn test_processed_material_is_locked() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        harness.transfer(&["rm-1"], SUPPLIER, ARTISAN, "log-1");
        harness.issue_work_order("wo-1", 10);
        harness.accept_work_order("wo-1", "b-1");
        harness.ok(
            "add/raw_material",
            json!({"batch": "b-1", "raw_material": "rm-1", "quantity": 10.0}),
            ARTISAN,
        );
        let violation = harness.rejected(
            "transfer/asset",
            json!({
                "assets": ["rm-1"],
                "recipient": BUYER,
                "logistics": {
                    "uid": "log-2",
                    "carrier": "Valley Freight",
                    "origin": "Delhi",
                    "destination": "Mumbai",
                    "dispatch_date": "2024-01-05",
                },
            }),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvalidStateTransition(_)));
    }

    #[test]
    fn test_packaging_couples_its_products() {
        let mut harness = with_products();
        package(&mut harness, "pkg-1", &["b-1-1", "b-1-2"]);
        for uid in ["b-1-1", "b-1-2"] {
            let asset = harness.asset(uid);
            assert_eq!(
                asset.as_product().unwrap().packaging.as_deref(),
                Some("pkg-1")
            );
        }
    }

    #[test]
    fn test_packaging_requires_owned_unpackaged_products() {
        let mut harness = with_products();
        package(&mut harness, "pkg-1", &["b-1-1"]);
        // Already packaged.
        let violation = harness.rejected(
            "create/asset",
            json!({
                "asset_type": "packaging",
                "uid": "pkg-2",
                "products": ["b-1-1"],
                "package_type": "carton",
            }),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
        // An empty packaging carries nothing.
        let violation = harness.rejected(
            "create/asset",
            json!({
                "asset_type": "packaging",
                "uid": "pkg-3",
                "products": [],
                "package_type": "carton",
            }),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::MalformedPayload(_)));
    }

    #[test]
    fn test_packaged_product_moves_only_with_its_packaging() {
        let mut harness = with_products();
        package(&mut harness, "pkg-1", &["b-1-1", "b-1-2"]);
        let violation = harness.rejected(
            "transfer/asset",
            json!({
                "assets": ["b-1-1"],
                "recipient": BUYER,
                "logistics": {
                    "uid": "log-x",
                    "carrier": "Valley Freight",
                    "origin": "Srinagar",
                    "destination": "Delhi",
                    "dispatch_date": "2024-01-02",
                },
            }),
            ARTISAN,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
    }

    #[test]
    fn test_transferring_a_packaging_carries_its_products() {
        let mut harness = with_products();
        package(&mut harness, "pkg-1", &["b-1-1", "b-1-2"]);
        harness.transfer(&["pkg-1"], ARTISAN, BUYER, "log-1");

        for uid in ["pkg-1", "b-1-1", "b-1-2"] {
            assert_eq!(harness.asset(uid).base().owner, BUYER, "{uid}");
            assert!(harness.owner_index(BUYER).contains(&uid.to_string()));
        }
        let logistics_asset = harness.asset("log-1");
        let logistics = logistics_asset.as_logistics().unwrap();
        assert_eq!(logistics.assets.len(), 3);
    }

    #[test]
    fn test_co_declared_packaged_product_travels_once() {
        let mut harness = with_products();
        package(&mut harness, "pkg-1", &["b-1-1", "b-1-2"]);
        // Listing a contained product next to its packaging is redundant but
        // valid.
        harness.transfer(&["pkg-1", "b-1-1"], ARTISAN, BUYER, "log-1");

        for uid in ["pkg-1", "b-1-1", "b-1-2"] {
            assert_eq!(harness.asset(uid).base().owner, BUYER, "{uid}");
        }
        let logistics_asset = harness.asset("log-1");
        assert_eq!(logistics_asset.as_logistics().unwrap().assets.len(), 3);
        // Each moved asset records the transfer exactly once.
        assert_eq!(harness.asset("b-1-1").base().previous_owners.len(), 1);
    }

    #[test]
    fn test_unpacked_product_transfers_independently() {
        let mut harness = with_products();
        package(&mut harness, "pkg-1", &["b-1-1", "b-1-2"]);
        harness.ok("unpackage/product", json!({"uid": "b-1-1"}), ARTISAN);

        let asset = harness.asset("b-1-1");
        assert!(asset.as_product().unwrap().packaging.is_none());
        let pkg_asset = harness.asset("pkg-1");
        assert_eq!(
            pkg_asset.as_packaging().unwrap().products,
            vec!["b-1-2".to_string()]
        );

        harness.transfer(&["b-1-1"], ARTISAN, BUYER, "log-1");
        assert_eq!(harness.asset("b-1-1").base().owner, BUYER);
        // The sibling stayed behind with its packaging.
        assert_eq!(harness.asset("b-1-2").base().owner, ARTISAN);
    }

    #[test]
    fn test_logistics_uid_collision_rejected() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        harness.create_raw_material("rm-2", 50.0);
        harness.transfer(&["rm-1"], SUPPLIER, ARTISAN, "log-1");
        let violation = harness.rejected(
            "transfer/asset",
            json!({
                "assets": ["rm-2"],
                "recipient": ARTISAN,
                "logistics": {
                    "uid": "log-1",
                    "carrier": "Valley Freight",
                    "origin": "Srinagar",
                    "destination": "Delhi",
                    "dispatch_date": "2024-01-03",
                },
            }),
            SUPPLIER,
        );
        assert!(matches!(violation, RuleViolation::DuplicateEntity { .. }));
    }

    #[test]
    fn test_duplicate_asset_in_one_transfer_rejected() {
        let mut harness = Harness::with_marketplace();
        harness.create_raw_material("rm-1", 100.0);
        let violation = harness.rejected(
            "transfer/asset",
            json!({
                "assets": ["rm-1", "rm-1"],
                "recipient": ARTISAN,
                "logistics": {
                    "uid": "log-1",
                    "carrier": "Valley Freight",
                    "origin": "Srinagar",
                    "destination": "Delhi",
                    "dispatch_date": "2024-01-02",
                },
            }),
            SUPPLIER,
        );
        assert!(matches!(violation, RuleViolation::MalformedPayload(_)));
    }
}
