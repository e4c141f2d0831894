//! # Event and State Taxonomy
//!
//! All enumerated values used by the CraftLedger entity model and dispatch
//! engine. Serde representations match the wire strings; an unknown string is
//! a deserialization error, never a fallback variant.

use serde::{Deserialize, Serialize};

// =============================================================================
// ACCOUNT ENUMS
// =============================================================================

/// Account category discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Sources raw materials.
    Supplier,
    /// Producer kind: runs batches, accepts work orders and sub-assignments.
    Artisan,
    /// Issues work orders and purchases products.
    Buyer,
    /// Tiered platform administrator.
    Admin,
}

impl AccountKind {
    /// Fields a creation request may never set directly for this kind.
    ///
    /// Base fields (identity, lifecycle, relationship lists) are stamped or
    /// maintained by handlers; variant lists are maintained by updaters.
    #[must_use]
    pub fn forbidden_fields(self) -> &'static [&'static str] {
        const BASE: &[&str] = &[
            "public_key",
            "assets",
            "work_orders_issued",
            "certifications",
            "authentication_status",
            "created_timestamp",
            "is_deleted",
            "deletion_reason",
            "history",
        ];
        match self {
            Self::Supplier => &[
                "public_key",
                "assets",
                "work_orders_issued",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "raw_materials_created",
                "raw_materials_supplied",
            ],
            Self::Artisan => &[
                "public_key",
                "assets",
                "work_orders_issued",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "work_orders_assigned",
                "work_orders_accepted",
                "work_orders_rejected",
                "work_orders_completed",
                "sub_assignments",
                "sub_assignments_accepted",
                "sub_assignments_rejected",
            ],
            Self::Buyer => BASE,
            Self::Admin => &[
                "public_key",
                "assets",
                "work_orders_issued",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "actions",
            ],
        }
    }

    /// Fields an edit request may set post-creation.
    #[must_use]
    pub fn editable_fields(self) -> &'static [&'static str] {
        match self {
            Self::Supplier => &["supplier_type"],
            Self::Artisan => &["skill_level"],
            Self::Buyer => &[],
            Self::Admin => &[],
        }
    }
}

/// Admin permission tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    /// Applies supervised edits to non-admin entities.
    Moderator,
    /// Approves or rejects entity authentication.
    Authenticator,
    /// Issues certifications.
    Certifier,
    /// Mints other admin accounts. Exactly one, created at bootstrap.
    SuperAdmin,
}

/// Operational status of an admin account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    #[default]
    Active,
    Suspended,
    Deactivated,
}

/// Authentication workflow status shared by accounts and assets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Artisan proficiency tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Expert,
}

// =============================================================================
// ASSET ENUMS
// =============================================================================

/// Asset category discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    RawMaterial,
    WorkOrder,
    ProductBatch,
    Product,
    Packaging,
    Logistics,
    SubAssignment,
    Certification,
}

impl AssetKind {
    /// Wire string for this kind, as carried in payload discriminators.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RawMaterial => "raw_material",
            Self::WorkOrder => "work_order",
            Self::ProductBatch => "product_batch",
            Self::Product => "product",
            Self::Packaging => "packaging",
            Self::Logistics => "logistics",
            Self::SubAssignment => "sub_assignment",
            Self::Certification => "certification",
        }
    }

    /// Fields a creation request may never set directly for this kind.
    #[must_use]
    pub fn forbidden_fields(self) -> &'static [&'static str] {
        const BASE: &[&str] = &[
            "owner",
            "previous_owners",
            "transfer_logistics",
            "certifications",
            "authentication_status",
            "created_timestamp",
            "is_deleted",
            "deletion_reason",
            "history",
        ];
        match self {
            Self::RawMaterial => &[
                "owner",
                "previous_owners",
                "transfer_logistics",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "supplier",
                "processor",
                "batches_used_in",
            ],
            Self::WorkOrder => &[
                "owner",
                "previous_owners",
                "transfer_logistics",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "assigner",
                "status",
                "batch",
                "rejection_reason",
                "completion_date",
            ],
            Self::ProductBatch => &[
                "owner",
                "previous_owners",
                "transfer_logistics",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "producer",
                "status",
                "raw_materials",
                "sub_assignments",
                "units_produced",
                "production_date",
            ],
            Self::SubAssignment => &[
                "owner",
                "previous_owners",
                "transfer_logistics",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "assigner",
                "status",
                "rejection_reason",
                "is_paid",
            ],
            Self::Logistics => &[
                "owner",
                "previous_owners",
                "transfer_logistics",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "transaction",
            ],
            Self::Certification => &[
                "owner",
                "previous_owners",
                "transfer_logistics",
                "certifications",
                "authentication_status",
                "created_timestamp",
                "is_deleted",
                "deletion_reason",
                "history",
                "issuer",
            ],
            Self::Product | Self::Packaging => BASE,
        }
    }

    /// Fields an edit request may set post-creation.
    ///
    /// Logistics and certifications are immutable once created.
    #[must_use]
    pub fn editable_fields(self) -> &'static [&'static str] {
        match self {
            Self::RawMaterial => &["unit_price", "source_location"],
            Self::WorkOrder => &[
                "product_description",
                "specifications",
                "estimated_completion_date",
            ],
            Self::ProductBatch => &["product_description", "specifications"],
            Self::Product => &["price"],
            Self::Packaging => &["seal_id"],
            Self::SubAssignment => &["task_description"],
            Self::Logistics | Self::Certification => &[],
        }
    }
}

// =============================================================================
// STATUS MACHINES
// =============================================================================

/// Work-order lifecycle. Forward-only, branching at `Pending`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    #[default]
    Pending,
    Accepted,
    Completed,
    Rejected,
}

/// Sub-assignment lifecycle. Forward-only, branching at `Pending`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubAssignmentStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Completed,
}

/// Product-batch lifecycle. One-way transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    InProgress,
    Completed,
}

// =============================================================================
// EVENT KINDS
// =============================================================================

/// Primary event kind declared by a transaction payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "bootstrap")]
    Bootstrap,
    #[serde(rename = "create/account")]
    AccountCreated,
    #[serde(rename = "create/admin")]
    AdminCreated,
    #[serde(rename = "create/asset")]
    AssetCreated,
    #[serde(rename = "transfer/asset")]
    AssetsTransferred,
    #[serde(rename = "accept/work_order")]
    WorkOrderAccepted,
    #[serde(rename = "reject/work_order")]
    WorkOrderRejected,
    #[serde(rename = "complete/work_order")]
    WorkOrderCompleted,
    #[serde(rename = "add/raw_material")]
    AddRawMaterial,
    #[serde(rename = "accept/sub_assignment")]
    SubAssignmentAccepted,
    #[serde(rename = "reject/sub_assignment")]
    SubAssignmentRejected,
    #[serde(rename = "complete/sub_assignment")]
    SubAssignmentCompleted,
    #[serde(rename = "paid/sub_assignment")]
    SubAssignmentPaid,
    #[serde(rename = "complete/batch")]
    BatchCompleted,
    #[serde(rename = "edit/entity")]
    EntityEdited,
    #[serde(rename = "delete/entity")]
    EntityDeleted,
    #[serde(rename = "unpackage/product")]
    ProductUnpacked,
    #[serde(rename = "issue/certification")]
    CertificationIssued,
    #[serde(rename = "moderate/edit")]
    ModeratorEdited,
    #[serde(rename = "authenticate/entity")]
    EntityAuthenticated,
}

impl EventKind {
    /// All primary event kinds in declaration order.
    pub const ALL: [EventKind; 20] = [
        Self::Bootstrap,
        Self::AccountCreated,
        Self::AdminCreated,
        Self::AssetCreated,
        Self::AssetsTransferred,
        Self::WorkOrderAccepted,
        Self::WorkOrderRejected,
        Self::WorkOrderCompleted,
        Self::AddRawMaterial,
        Self::SubAssignmentAccepted,
        Self::SubAssignmentRejected,
        Self::SubAssignmentCompleted,
        Self::SubAssignmentPaid,
        Self::BatchCompleted,
        Self::EntityEdited,
        Self::EntityDeleted,
        Self::ProductUnpacked,
        Self::CertificationIssued,
        Self::ModeratorEdited,
        Self::EntityAuthenticated,
    ];

    /// Wire string for this event kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::AccountCreated => "create/account",
            Self::AdminCreated => "create/admin",
            Self::AssetCreated => "create/asset",
            Self::AssetsTransferred => "transfer/asset",
            Self::WorkOrderAccepted => "accept/work_order",
            Self::WorkOrderRejected => "reject/work_order",
            Self::WorkOrderCompleted => "complete/work_order",
            Self::AddRawMaterial => "add/raw_material",
            Self::SubAssignmentAccepted => "accept/sub_assignment",
            Self::SubAssignmentRejected => "reject/sub_assignment",
            Self::SubAssignmentCompleted => "complete/sub_assignment",
            Self::SubAssignmentPaid => "paid/sub_assignment",
            Self::BatchCompleted => "complete/batch",
            Self::EntityEdited => "edit/entity",
            Self::EntityDeleted => "delete/entity",
            Self::ProductUnpacked => "unpackage/product",
            Self::CertificationIssued => "issue/certification",
            Self::ModeratorEdited => "moderate/edit",
            Self::EntityAuthenticated => "authenticate/entity",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secondary event kind derived from the primary event and the payload's
/// declared discriminators. Each triggers an additional handler chain for the
/// same transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubEventKind {
    #[serde(rename = "create/asset/work_order")]
    WorkOrderCreated,
    #[serde(rename = "create/asset/packaging")]
    PackagingCreated,
    #[serde(rename = "create/asset/sub_assignment")]
    SubAssignmentCreated,
    #[serde(rename = "accept/work_order/batch")]
    BatchCreated,
    #[serde(rename = "transfer/asset/logistics")]
    LogisticsCreated,
}

impl SubEventKind {
    /// All sub-event kinds in fixed derivation order.
    pub const ALL: [SubEventKind; 5] = [
        Self::WorkOrderCreated,
        Self::PackagingCreated,
        Self::SubAssignmentCreated,
        Self::BatchCreated,
        Self::LogisticsCreated,
    ];

    /// Wire string for this sub-event kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkOrderCreated => "create/asset/work_order",
            Self::PackagingCreated => "create/asset/packaging",
            Self::SubAssignmentCreated => "create/asset/sub_assignment",
            Self::BatchCreated => "accept/work_order/batch",
            Self::LogisticsCreated => "transfer/asset/logistics",
        }
    }
}

impl std::fmt::Display for SubEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================
