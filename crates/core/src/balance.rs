//! Derived account balance and per-account entry versions.

use serde::{Deserialize, Serialize};

use crate::account::AccountIdentity;
use crate::value_object::ValueObject;

/// Per-account entry version, assigned monotonically at append time.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Balance of one account, derived from its committed ledger entries.
///
/// Never persisted; recomputed on every query. `version` is the highest entry
/// version observed for the account. Net balance is left to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account: AccountIdentity,
    pub version: Version,
    pub total_credit: u64,
    pub total_debit: u64,
}

impl AccountBalance {
    pub fn new(account: AccountIdentity, version: Version, total_credit: u64, total_debit: u64) -> Self {
        Self {
            account,
            version,
            total_credit,
            total_debit,
        }
    }
}

impl ValueObject for AccountBalance {}
