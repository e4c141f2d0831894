//! # Domain Layer
//!
//! Pure domain logic with no storage or dispatch concerns: deterministic
//! state addressing and the per-transaction event context.

pub mod addressing;
pub mod context;
