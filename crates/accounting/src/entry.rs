use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use tally_core::{AccountIdentity, DomainError, Version};

/// Direction of a recorded movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Credit,
    Debit,
}

impl Operation {
    /// Label stored in the entry log's `operation` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Credit => "credit",
            Operation::Debit => "debit",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Operation::Credit),
            "debit" => Ok(Operation::Debit),
            other => Err(DomainError::validation(format!("unknown operation '{other}'"))),
        }
    }
}

/// One immutable movement recorded against an account (read-only input).
///
/// `version` is monotonically increasing per account and assigned when the
/// entry is appended. `amount` is in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: uuid::Uuid,
    pub transaction_id: uuid::Uuid,
    pub account: AccountIdentity,
    pub operation: Operation,
    pub amount: u64,
    pub version: Version,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn credit(account: AccountIdentity, amount: u64, version: Version) -> Self {
        Self::new(account, Operation::Credit, amount, version)
    }

    pub fn debit(account: AccountIdentity, amount: u64, version: Version) -> Self {
        Self::new(account, Operation::Debit, amount, version)
    }

    /// Entry with fresh ids, stamped now.
    pub fn new(account: AccountIdentity, operation: Operation, amount: u64, version: Version) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            transaction_id: uuid::Uuid::now_v7(),
            account,
            operation,
            amount,
            version,
            created_at: Utc::now(),
        }
    }
}
