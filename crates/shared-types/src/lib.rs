//! # Shared Types - CraftLedger Domain Model
//!
//! Single Source of Truth for the types shared across CraftLedger subsystems:
//!
//! - [`enums`] - event taxonomy and enumerated entity states
//! - [`accounts`] - the closed `Account` sum type and its variants
//! - [`assets`] - the closed `Asset` sum type and its variants
//! - [`history`] - append-only provenance log entries
//! - [`payload`] - the decoded transaction payload envelope
//! - [`errors`] - the rule-violation taxonomy surfaced as transaction
//!   rejections
//!
//! All enumerated values deserialize strictly: an unrecognized discriminator
//! or status string is a hard error, never a silent default. Every map that
//! reaches ledger storage is a `BTreeMap`, so serialization is byte-identical
//! on replay.

pub mod accounts;
pub mod assets;
pub mod enums;
pub mod errors;
pub mod history;
pub mod payload;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::accounts::{
        Account, AccountBase, AdminAccount, AdminAction, ArtisanAccount, BuyerAccount,
        SupplierAccount,
    };
    pub use crate::assets::{
        Asset, AssetBase, Certification, Logistics, Packaging, Product, ProductBatch, RawMaterial,
        SubAssignment, UsageRecord, WorkOrder,
    };
    pub use crate::enums::{
        AccountKind, AdminLevel, AdminStatus, AssetKind, AuthenticationStatus, BatchStatus,
        EventKind, SkillLevel, SubAssignmentStatus, SubEventKind, WorkOrderStatus,
    };
    pub use crate::errors::{RuleViolation, StateError};
    pub use crate::history::HistoryEntry;
    pub use crate::payload::{Transaction, TransactionPayload};
    pub use crate::Entity;
}

use accounts::Account;
use assets::Asset;
use enums::AuthenticationStatus;
use history::HistoryEntry;

/// Common operations over both entity categories.
///
/// Accounts are keyed by public key, assets by uid; everything else an
/// updater touches generically (history, soft delete, certifications,
/// authentication) goes through this trait.
pub trait Entity {
    /// Primary identifier: public key for accounts, uid for assets.
    fn identifier(&self) -> &str;

    /// Soft-delete flag. Monotone: once set it never clears.
    fn is_deleted(&self) -> bool;

    /// Marks the entity deleted, recording the reason.
    fn mark_deleted(&mut self, reason: String);

    /// Append-only history log.
    fn history_mut(&mut self) -> &mut Vec<HistoryEntry>;

    /// Certifications held by or attached to this entity.
    fn certifications_mut(&mut self) -> &mut Vec<String>;

    /// Updates the authentication status.
    fn set_authentication_status(&mut self, status: AuthenticationStatus);
}

impl Entity for Account {
    fn identifier(&self) -> &str {
        &self.base().public_key
    }

    fn is_deleted(&self) -> bool {
        self.base().is_deleted
    }

    fn mark_deleted(&mut self, reason: String) {
        let base = self.base_mut();
        base.is_deleted = true;
        base.deletion_reason = Some(reason);
    }

    fn history_mut(&mut self) -> &mut Vec<HistoryEntry> {
        &mut self.base_mut().history
    }

    fn certifications_mut(&mut self) -> &mut Vec<String> {
        &mut self.base_mut().certifications
    }

    fn set_authentication_status(&mut self, status: AuthenticationStatus) {
        self.base_mut().authentication_status = status;
    }
}

impl Entity for Asset {
    fn identifier(&self) -> &str {
        &self.base().uid
    }

    fn is_deleted(&self) -> bool {
        self.base().is_deleted
    }

    fn mark_deleted(&mut self, reason: String) {
        let base = self.base_mut();
        base.is_deleted = true;
        base.deletion_reason = Some(reason);
    }

    fn history_mut(&mut self) -> &mut Vec<HistoryEntry> {
        &mut self.base_mut().history
    }

    fn certifications_mut(&mut self) -> &mut Vec<String> {
        &mut self.base_mut().certifications
    }

    fn set_authentication_status(&mut self, status: AuthenticationStatus) {
        self.base_mut().authentication_status = status;
    }
}
