//! # Asset Entities
//!
//! The closed `Asset` sum type and its variants. The `asset_type` tag selects
//! the variant during deserialization; an unknown tag is a hard rejection.
//!
//! All asset kinds share one ledger kind-prefix and are discriminated by
//! stored content, so any asset address can be decoded without knowing the
//! kind up front.

use crate::enums::{
    AssetKind, AuthenticationStatus, BatchStatus, SubAssignmentStatus, WorkOrderStatus,
};
use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// BASE
// =============================================================================

/// Fields shared by every asset variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetBase {
    /// Primary identifier.
    pub uid: String,
    /// Public key of the current owner.
    pub owner: String,
    /// Public keys of all previous owners, in transfer order.
    #[serde(default)]
    pub previous_owners: Vec<String>,
    /// Logistics asset uids recorded across transfers.
    #[serde(default)]
    pub transfer_logistics: Vec<String>,
    /// Certifications attached to this asset.
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

impl AssetBase {
    /// Creates a fresh base with empty provenance lists.
    #[must_use]
    pub fn new(uid: &str, owner: &str, created_timestamp: &str) -> Self {
        Self {
            uid: uid.to_string(),
            owner: owner.to_string(),
            previous_owners: Vec::new(),
            transfer_logistics: Vec::new(),
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
// USAGE RECORDS
// =============================================================================

/// One consumption of raw material by a batch. Recorded on both sides of the
/// relationship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Batch that consumed the material.
    pub batch: String,
    /// Raw material consumed.
    pub raw_material: String,
    /// Quantity consumed, in the material's unit.
    pub quantity: f64,
}

// =============================================================================
// VARIANTS
// =============================================================================

/// Raw material sourced by a supplier and consumed into batches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    #[serde(flatten)]
    pub base: AssetBase,
    /// Material category, e.g. "wool".
    pub material_type: String,
    /// Supplier public key, stamped from the creating signer.
    #[serde(default)]
    pub supplier: String,
    /// Original quantity.
    pub quantity: f64,
    /// Unit of the quantity, e.g. "kg".
    pub quantity_unit: String,
    /// Price per unit.
    #[serde(default)]
    pub unit_price: f64,
    /// Producer that first consumed this material. Once set the material is
    /// non-transferable and non-editable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    /// Per-batch consumption records. Cumulative quantity never exceeds
    /// `quantity`.
    #[serde(default)]
    pub batches_used_in: Vec<UsageRecord>,
    /// Origin of the material.
    #[serde(default)]
    pub source_location: String,
}

impl RawMaterial {
    /// Quantity not yet consumed by any batch.
    #[must_use]
    pub fn remaining_quantity(&self) -> f64 {
        let used: f64 = self.batches_used_in.iter().map(|u| u.quantity).sum();
        self.quantity - used
    }
}

/// Work order issued to an artisan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    #[serde(flatten)]
    pub base: AssetBase,
    /// Issuer public key, stamped from the creating signer.
    #[serde(default)]
    pub assigner: String,
    /// Artisan public key this order is assigned to.
    pub assignee: String,
    /// Batch created when the order was accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    /// Lifecycle status. Forward-only, branching at pending.
    #[serde(default)]
    pub status: WorkOrderStatus,
    /// Reason recorded when the order was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Number of units requested.
    pub order_quantity: u64,
    /// Unit of the requested quantity.
    pub quantity_unit: String,
    /// Total price agreed for the order.
    pub total_price: f64,
    /// Free-text description of the requested product.
    #[serde(default)]
    pub product_description: String,
    /// Structured specs (size, color, material).
    #[serde(default)]
    pub specifications: Vec<String>,
    /// Target completion date.
    #[serde(default)]
    pub estimated_completion_date: String,
    /// Actual completion date, set by the completion event.
    #[serde(default)]
    pub completion_date: String,
}

/// A group of products produced together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductBatch {
    #[serde(flatten)]
    pub base: AssetBase,
    /// Producing artisan, stamped from the creating signer.
    #[serde(default)]
    pub producer: String,
    /// Planned quantity.
    pub quantity: f64,
    /// Unit of the quantity, e.g. "pieces".
    pub unit: String,
    /// Lifecycle status. One-way transition to completed.
    #[serde(default)]
    pub status: BatchStatus,
    /// Raw-material consumption records.
    #[serde(default)]
    pub raw_materials: Vec<UsageRecord>,
    /// Sub-assignment uids linked to this batch.
    #[serde(default)]
    pub sub_assignments: Vec<String>,
    /// Originating work order, when the batch was created by acceptance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order: Option<String>,
    /// Units actually produced, set only on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units_produced: Option<u64>,
    /// Date the batch was completed.
    #[serde(default)]
    pub production_date: String,
    /// Free-text description of the product.
    #[serde(default)]
    pub product_description: String,
    /// Structured specs inherited from the work order or declared directly.
    #[serde(default)]
    pub specifications: Vec<String>,
}

/// Individual product minted from a completed batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(flatten)]
    pub base: AssetBase,
    /// Parent batch.
    pub batch: String,
    /// Serial index, unique within the batch.
    pub serial_no: u64,
    /// Unit price.
    #[serde(default)]
    pub price: f64,
    /// Quantity represented by this product.
    #[serde(default)]
    pub quantity: f64,
    /// Unit of the quantity.
    #[serde(default)]
    pub unit: String,
    /// Packaging this product is contained in, if any. While set, the product
    /// only moves together with that packaging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
}

/// Packaging grouping products for shipment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Packaging {
    #[serde(flatten)]
    pub base: AssetBase,
    /// Contained product uids.
    pub products: Vec<String>,
    /// Packaging category.
    pub package_type: String,
    /// Tamper seal identifier.
    #[serde(default)]
    pub seal_id: String,
    /// Net weight.
    #[serde(default)]
    pub net_weight: f64,
    /// Gross weight.
    #[serde(default)]
    pub gross_weight: f64,
}

/// Movement of goods through the supply chain. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Logistics {
    #[serde(flatten)]
    pub base: AssetBase,
    /// Signature of the transfer transaction that created this record.
    #[serde(default)]
    pub transaction: String,
    /// Assets moved by this transfer.
    pub assets: Vec<String>,
    /// Carrier name.
    pub carrier: String,
    /// Pickup location.
    pub origin: String,
    /// Delivery location.
    pub destination: String,
    /// Recipient public key.
    pub recipient: String,
    /// Dispatch date.
    pub dispatch_date: String,
    /// Carrier tracking number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
}

/// Sub-assignment of labor for part of a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubAssignment {
    #[serde(flatten)]
    pub base: AssetBase,
    /// Parent batch.
    pub batch: String,
    /// Batch owner that issued the sub-assignment, stamped from the signer.
    #[serde(default)]
    pub assigner: String,
    /// Artisan public key the work is assigned to.
    pub assignee: String,
    /// Lifecycle status. Forward-only, branching at pending.
    #[serde(default)]
    pub status: SubAssignmentStatus,
    /// Agreed pay.
    pub pay: f64,
    /// Free text, e.g. "knit 50 wool shawls".
    pub task_description: String,
    /// Reason recorded when the assignment was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Whether the assigner has marked the completed work as paid.
    #[serde(default)]
    pub is_paid: bool,
}

/// Certificate issued by a certifier admin. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(flatten)]
    pub base: AssetBase,
    /// Title or type, e.g. "GI Certificate".
    pub title: String,
    /// Issuing admin public key, stamped from the creating signer.
    #[serde(default)]
    pub issuer: String,
    /// Public key or uid of the certified entity.
    pub holder: String,
    /// Date of issue.
    pub issue_timestamp: String,
    /// Optional validity end date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_timestamp: Option<String>,
    /// Summary of the certificate.
    #[serde(default)]
    pub description: String,
    /// Domain-specific key-value details.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// =============================================================================
// SUM TYPE
// =============================================================================

/// An asset record as stored in the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "asset_type", rename_all = "snake_case")]
pub enum Asset {
    RawMaterial(RawMaterial),
    WorkOrder(WorkOrder),
    ProductBatch(ProductBatch),
    Product(Product),
    Packaging(Packaging),
    Logistics(Logistics),
    SubAssignment(SubAssignment),
    Certification(Certification),
}

impl Asset {
    /// The kind discriminator of this asset.
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::RawMaterial(_) => AssetKind::RawMaterial,
            Self::WorkOrder(_) => AssetKind::WorkOrder,
            Self::ProductBatch(_) => AssetKind::ProductBatch,
            Self::Product(_) => AssetKind::Product,
            Self::Packaging(_) => AssetKind::Packaging,
            Self::Logistics(_) => AssetKind::Logistics,
            Self::SubAssignment(_) => AssetKind::SubAssignment,
            Self::Certification(_) => AssetKind::Certification,
        }
    }

    /// Shared base fields.
    #[must_use]
    pub fn base(&self) -> &AssetBase {
        match self {
            Self::RawMaterial(a) => &a.base,
            Self::WorkOrder(a) => &a.base,
            Self::ProductBatch(a) => &a.base,
            Self::Product(a) => &a.base,
            Self::Packaging(a) => &a.base,
            Self::Logistics(a) => &a.base,
            Self::SubAssignment(a) => &a.base,
            Self::Certification(a) => &a.base,
        }
    }

    /// Shared base fields, mutable.
    pub fn base_mut(&mut self) -> &mut AssetBase {
        match self {
            Self::RawMaterial(a) => &mut a.base,
            Self::WorkOrder(a) => &mut a.base,
            Self::ProductBatch(a) => &mut a.base,
            Self::Product(a) => &mut a.base,
            Self::Packaging(a) => &mut a.base,
            Self::Logistics(a) => &mut a.base,
            Self::SubAssignment(a) => &mut a.base,
            Self::Certification(a) => &mut a.base,
        }
    }

    /// The asset's uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.base().uid
    }

    /// The current owner's public key.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.base().owner
    }
}

macro_rules! asset_accessors {
    ($($variant:ident => ($as_ref:ident, $as_mut:ident, $ty:ty)),+ $(,)?) => {
        impl Asset {
            $(
                /// Variant accessor.
                #[must_use]
                pub fn $as_ref(&self) -> Option<&$ty> {
                    match self {
                        Self::$variant(a) => Some(a),
                        _ => None,
                    }
                }

                /// Variant accessor, mutable.
                pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        Self::$variant(a) => Some(a),
                        _ => None,
                    }
                }
            )+
        }
    };
}

asset_accessors! {
    RawMaterial => (as_raw_material, as_raw_material_mut, RawMaterial),
    WorkOrder => (as_work_order, as_work_order_mut, WorkOrder),
    ProductBatch => (as_product_batch, as_product_batch_mut, ProductBatch),
    Product => (as_product, as_product_mut, Product),
    Packaging => (as_packaging, as_packaging_mut, Packaging),
    Logistics => (as_logistics, as_logistics_mut, Logistics),
    SubAssignment => (as_sub_assignment, as_sub_assignment_mut, SubAssignment),
    Certification => (as_certification, as_certification_mut, Certification),
}

// =============================================================================
// TESTS
// =============================================================================
