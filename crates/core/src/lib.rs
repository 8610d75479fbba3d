//! `tally-core` — ledger read-side building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! account identities, versions and the derived balance value.

pub mod account;
pub mod balance;
pub mod error;
pub mod value_object;

pub use account::{AccountClass, AccountIdentity};
pub use balance::{AccountBalance, Version};
pub use error::{DomainError, DomainResult};
pub use value_object::ValueObject;
