//! Registration scenarios: account uniqueness, email uniqueness, admin
//! minting and the bootstrap gate.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{Harness, ARTISAN, BUYER, ROOT, SUPPLIER};
    use cl_execution::prelude::*;
    use serde_json::json;

    #[test]
    fn test_marketplace_accounts_register() {
        let harness = Harness::with_marketplace();
        assert_eq!(harness.account(SUPPLIER).kind(), AccountKind::Supplier);
        assert_eq!(harness.account(ARTISAN).kind(), AccountKind::Artisan);
        assert_eq!(harness.account(BUYER).kind(), AccountKind::Buyer);
        let root = harness.account(ROOT);
        let admin = root.as_admin().expect("root is an admin");
        assert_eq!(admin.permission_level, AdminLevel::SuperAdmin);
    }

    #[test]
    fn test_second_account_for_same_key_rejected() {
        let mut harness = Harness::with_marketplace();
        let violation = harness.rejected(
            "create/account",
            json!({"account_type": "buyer", "email": "second@example.com"}),
            SUPPLIER,
        );
        assert!(matches!(violation, RuleViolation::DuplicateEntity { kind: "account", .. }));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut harness = Harness::with_marketplace();
        let violation = harness.rejected(
            "create/account",
            json!({"account_type": "buyer", "email": "supplier@example.com"}),
            "pk-new",
        );
        assert!(matches!(violation, RuleViolation::DuplicateEntity { kind: "email", .. }));
    }

    #[test]
    fn test_unknown_account_type_rejected() {
        let mut harness = Harness::bootstrapped();
        let violation = harness.rejected(
            "create/account",
            json!({"account_type": "workshop", "email": "w@example.com"}),
            "pk-new",
        );
        assert!(matches!(violation, RuleViolation::MalformedPayload(_)));
    }

    #[test]
    fn test_handler_owned_fields_rejected_at_registration() {
        let mut harness = Harness::bootstrapped();
        let violation = harness.rejected(
            "create/account",
            json!({
                "account_type": "buyer",
                "email": "b@example.com",
                "assets": ["stolen-asset"],
            }),
            "pk-new",
        );
        assert!(matches!(violation, RuleViolation::MalformedPayload(_)));
    }

    #[test]
    fn test_admin_kind_blocked_on_account_creation() {
        let mut harness = Harness::bootstrapped();
        let violation = harness.rejected(
            "create/account",
            json!({"account_type": "admin", "email": "a@example.com"}),
            "pk-new",
        );
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }

    #[test]
    fn test_super_admin_mints_admins() {
        let mut harness = Harness::bootstrapped();
        harness.ok(
            "create/admin",
            json!({
                "target_public_key": "pk-certifier",
                "email": "certifier@example.com",
                "permission_level": "certifier",
            }),
            ROOT,
        );
        let account = harness.account("pk-certifier");
        let admin = account.as_admin().expect("certifier is an admin");
        assert_eq!(admin.permission_level, AdminLevel::Certifier);
        assert_eq!(admin.status, AdminStatus::Active);
        // The minting is logged on the super admin.
        let root = harness.account(ROOT);
        assert!(!root.as_admin().unwrap().actions.is_empty());
    }

    #[test]
    fn test_non_super_admin_cannot_mint_admins() {
        let mut harness = Harness::with_marketplace();
        let violation = harness.rejected(
            "create/admin",
            json!({"target_public_key": "pk-x", "email": "x@example.com"}),
            BUYER,
        );
        assert!(matches!(violation, RuleViolation::Unauthorized(_)));
    }

    #[test]
    fn test_second_super_admin_rejected() {
        let mut harness = Harness::bootstrapped();
        let violation = harness.rejected(
            "create/admin",
            json!({
                "target_public_key": "pk-x",
                "email": "x@example.com",
                "permission_level": "super_admin",
            }),
            ROOT,
        );
        assert!(matches!(violation, RuleViolation::InvariantViolation(_)));
    }

    #[test]
    fn test_deleting_an_account_frees_its_email() {
        let mut harness = Harness::with_marketplace();
        harness.ok(
            "delete/entity",
            json!({"target": BUYER, "reason": "left the platform"}),
            BUYER,
        );
        assert!(harness.account(BUYER).base().is_deleted);
        // Same email, new key.
        harness.ok(
            "create/account",
            json!({"account_type": "buyer", "email": "buyer@example.com"}),
            "pk-buyer-next",
        );
    }

    #[test]
    fn test_deleted_account_keeps_history() {
        let mut harness = Harness::with_marketplace();
        harness.ok(
            "delete/entity",
            json!({"target": BUYER, "reason": "left the platform"}),
            BUYER,
        );
        let account = harness.account(BUYER);
        assert_eq!(account.base().deletion_reason.as_deref(), Some("left the platform"));
        let last = account.base().history.last().expect("deletion recorded");
        assert_eq!(last.event, "delete/entity");
    }
}
