//! # Account Entities
//!
//! The closed `Account` sum type and its variants. The `account_type` tag
//! selects the variant during deserialization; an unknown tag is a hard
//! rejection.
//!
//! Variant structs flatten a shared [`AccountBase`] so all accounts carry the
//! same identity, lifecycle and provenance fields. Relationship lists
//! (assets, work orders, sub-assignments) are maintained exclusively by
//! updater handlers, never set at creation.

use crate::enums::{
    AccountKind, AdminLevel, AdminStatus, AuthenticationStatus, SkillLevel,
};
use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};

// =============================================================================
// BASE
// =============================================================================

/// Fields shared by every account variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountBase {
    /// Primary identifier. Exactly one non-deleted account per public key.
    pub public_key: String,
    /// Contact email. Unique across non-deleted accounts via the email index.
    pub email: String,
    /// Identifiers of assets currently owned by this account.
    #[serde(default)]
    pub assets: Vec<String>,
    /// Identifiers of work orders issued by this account.
    #[serde(default)]
    pub work_orders_issued: Vec<String>,
    /// Certifications held by this account.
    #[serde(default)]
    pub certifications: Vec<String>,
    /// Authentication workflow status.
    #[serde(default)]
    pub authentication_status: AuthenticationStatus,
    /// Timestamp declared by the creating transaction.
    #[serde(default)]
    pub created_timestamp: String,
    /// Soft-delete flag. Monotone.
    #[serde(default)]
    pub is_deleted: bool,
    /// Reason recorded at deletion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_reason: Option<String>,
    /// Append-only provenance log.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl AccountBase {
    /// Creates a fresh base with empty relationship lists.
    #[must_use]
    pub fn new(public_key: &str, email: &str, created_timestamp: &str) -> Self {
        Self {
            public_key: public_key.to_string(),
            email: email.to_string(),
            assets: Vec::new(),
            work_orders_issued: Vec::new(),
            certifications: Vec::new(),
            authentication_status: AuthenticationStatus::Pending,
            created_timestamp: created_timestamp.to_string(),
            is_deleted: false,
            deletion_reason: None,
            history: Vec::new(),
        }
    }
}

// =============================================================================
// VARIANTS
// =============================================================================

/// Supplier account: sources raw materials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplierAccount {
    #[serde(flatten)]
    pub base: AccountBase,
    /// Raw materials this supplier created.
    #[serde(default)]
    pub raw_materials_created: Vec<String>,
    /// Raw materials this supplier transferred onward.
    #[serde(default)]
    pub raw_materials_supplied: Vec<String>,
    /// Free-text supplier category.
    #[serde(default)]
    pub supplier_type: String,
}

/// Artisan account: the producer kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtisanAccount {
    #[serde(flatten)]
    pub base: AccountBase,
    /// Proficiency tier.
    pub skill_level: SkillLevel,
    /// Work orders assigned to this artisan.
    #[serde(default)]
    pub work_orders_assigned: Vec<String>,
    /// Work orders this artisan accepted.
    #[serde(default)]
    pub work_orders_accepted: Vec<String>,
    /// Work orders this artisan rejected.
    #[serde(default)]
    pub work_orders_rejected: Vec<String>,
    /// Work orders this artisan completed.
    #[serde(default)]
    pub work_orders_completed: Vec<String>,
    /// Sub-assignments assigned to this artisan.
    #[serde(default)]
    pub sub_assignments: Vec<String>,
    /// Sub-assignments this artisan accepted.
    #[serde(default)]
    pub sub_assignments_accepted: Vec<String>,
    /// Sub-assignments this artisan rejected.
    #[serde(default)]
    pub sub_assignments_rejected: Vec<String>,
}

/// Buyer account: issues work orders and purchases products.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuyerAccount {
    #[serde(flatten)]
    pub base: AccountBase,
}

/// One recorded admin action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminAction {
    /// Free-text description supplied by the admin event payload.
    pub details: String,
    /// Signature of the transaction that performed the action.
    pub transaction: String,
    /// Timestamp declared by the transaction payload.
    pub timestamp: String,
}

/// Admin account: manages the platform at a given permission tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminAccount {
    #[serde(flatten)]
    pub base: AccountBase,
    /// Permission tier. `SuperAdmin` exists exactly once, from bootstrap.
    #[serde(default = "default_admin_level")]
    pub permission_level: AdminLevel,
    /// Operational status. Only active admins may act.
    #[serde(default)]
    pub status: AdminStatus,
    /// Append-only log of admin actions taken by this account.
    #[serde(default)]
    pub actions: Vec<AdminAction>,
}

fn default_admin_level() -> AdminLevel {
    AdminLevel::Moderator
}

// =============================================================================
// SUM TYPE
// =============================================================================

/// An account record as stored in the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "account_type", rename_all = "snake_case")]
pub enum Account {
    Supplier(SupplierAccount),
    Artisan(ArtisanAccount),
    Buyer(BuyerAccount),
    Admin(AdminAccount),
}

impl Account {
    /// The kind discriminator of this account.
    #[must_use]
    pub fn kind(&self) -> AccountKind {
        match self {
            Self::Supplier(_) => AccountKind::Supplier,
            Self::Artisan(_) => AccountKind::Artisan,
            Self::Buyer(_) => AccountKind::Buyer,
            Self::Admin(_) => AccountKind::Admin,
        }
    }

    /// Shared base fields.
    #[must_use]
    pub fn base(&self) -> &AccountBase {
        match self {
            Self::Supplier(a) => &a.base,
            Self::Artisan(a) => &a.base,
            Self::Buyer(a) => &a.base,
            Self::Admin(a) => &a.base,
        }
    }

    /// Shared base fields, mutable.
    pub fn base_mut(&mut self) -> &mut AccountBase {
        match self {
            Self::Supplier(a) => &mut a.base,
            Self::Artisan(a) => &mut a.base,
            Self::Buyer(a) => &mut a.base,
            Self::Admin(a) => &mut a.base,
        }
    }

    /// The account's public key.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.base().public_key
    }

    /// The artisan variant, if this account is one.
    #[must_use]
    pub fn as_artisan(&self) -> Option<&ArtisanAccount> {
        match self {
            Self::Artisan(a) => Some(a),
            _ => None,
        }
    }

    /// The artisan variant, mutable.
    pub fn as_artisan_mut(&mut self) -> Option<&mut ArtisanAccount> {
        match self {
            Self::Artisan(a) => Some(a),
            _ => None,
        }
    }

    /// The admin variant, if this account is one.
    #[must_use]
    pub fn as_admin(&self) -> Option<&AdminAccount> {
        match self {
            Self::Admin(a) => Some(a),
            _ => None,
        }
    }

    /// The admin variant, mutable.
    pub fn as_admin_mut(&mut self) -> Option<&mut AdminAccount> {
        match self {
            Self::Admin(a) => Some(a),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
