//! # State Addressing
//!
//! Deterministic 70-hex-character ledger addresses:
//!
//! ```text
//! [ namespace: 6 ][ kind prefix: 2 ][ sha512(identifier) hex: 62 ]
//! ```
//!
//! The namespace is the first 6 hex characters of `sha512(FAMILY_NAME)`.
//! Kind prefixes partition the namespace:
//!
//! | Prefix | Contents |
//! |--------|----------|
//! | `00` | accounts, keyed by public key |
//! | `01` | email index entries, keyed by email |
//! | `02` | the bootstrap flag |
//! | `10` | assets of every kind, keyed by uid |
//! | `f0` | owner index, keyed by owner public key |
//! | `f1` | kind index, keyed by asset-kind wire string |
//!
//! All asset kinds share one prefix, so any asset address resolves without
//! knowing the kind up front; the stored `asset_type` tag discriminates.

use crate::FAMILY_NAME;
use sha2::{Digest, Sha512};
use shared_types::enums::AssetKind;
use std::sync::OnceLock;

const ACCOUNT_PREFIX: &str = "00";
const EMAIL_INDEX_PREFIX: &str = "01";
const BOOTSTRAP_PREFIX: &str = "02";
const ASSET_PREFIX: &str = "10";
const OWNER_INDEX_PREFIX: &str = "f0";
const KIND_INDEX_PREFIX: &str = "f1";

/// First 6 hex characters of `sha512(FAMILY_NAME)`.
#[must_use]
pub fn namespace() -> &'static str {
    static NAMESPACE: OnceLock<String> = OnceLock::new();
    NAMESPACE.get_or_init(|| {
        let digest = Sha512::digest(FAMILY_NAME.as_bytes());
        hex::encode(digest)[..6].to_string()
    })
}

fn identifier_hash(identifier: &str) -> String {
    let digest = Sha512::digest(identifier.as_bytes());
    hex::encode(digest)[..62].to_string()
}

fn compose(prefix: &str, identifier: &str) -> String {
    format!("{}{prefix}{}", namespace(), identifier_hash(identifier))
}

/// Address of the account keyed by `public_key`.
#[must_use]
pub fn account_address(public_key: &str) -> String {
    compose(ACCOUNT_PREFIX, public_key)
}

/// Address of the email-uniqueness index entry for `email`.
#[must_use]
pub fn email_index_address(email: &str) -> String {
    compose(EMAIL_INDEX_PREFIX, email)
}

/// Address of the one-time bootstrap flag.
#[must_use]
pub fn bootstrap_address() -> String {
    compose(BOOTSTRAP_PREFIX, "bootstrap")
}

/// Address of the asset keyed by `uid`, regardless of kind.
#[must_use]
pub fn asset_address(uid: &str) -> String {
    compose(ASSET_PREFIX, uid)
}

/// Address of the owner index entry listing assets owned by `public_key`.
#[must_use]
pub fn owner_index_address(public_key: &str) -> String {
    compose(OWNER_INDEX_PREFIX, public_key)
}

/// Address of the kind index entry listing assets of `kind`.
#[must_use]
pub fn kind_index_address(kind: AssetKind) -> String {
    compose(KIND_INDEX_PREFIX, kind.as_str())
}

// =============================================================================
// TESTS
// =============================================================================
