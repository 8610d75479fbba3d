//! Account identity: the composite key naming a ledger account.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// High-level account category.
///
/// The lowercase form is the label stored in the entry log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    Liability,
    Assets,
    Income,
    Expense,
    Equity,
}

impl AccountClass {
    pub const ALL: [AccountClass; 5] = [
        AccountClass::Liability,
        AccountClass::Assets,
        AccountClass::Income,
        AccountClass::Expense,
        AccountClass::Equity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountClass::Liability => "liability",
            AccountClass::Assets => "assets",
            AccountClass::Income => "income",
            AccountClass::Expense => "expense",
            AccountClass::Equity => "equity",
        }
    }
}

impl core::fmt::Display for AccountClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountClass::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown account class '{s}'")))
    }
}

/// Composite key `(class, group, subgroup, id)` uniquely naming a ledger account.
///
/// Equality is structural over all four fields. The textual form is the dotted
/// path `class.group.subgroup.id`, e.g. `assets.bacen.conta_liquidacao.tesouraria`.
///
/// `new` accepts any segment text, but only identities whose segments contain
/// no `.` round-trip through `Display` and `FromStr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountIdentity {
    class: AccountClass,
    group: String,
    subgroup: String,
    id: String,
}

impl AccountIdentity {
    pub fn new(
        class: AccountClass,
        group: impl Into<String>,
        subgroup: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            class,
            group: group.into(),
            subgroup: subgroup.into(),
            id: id.into(),
        }
    }

    pub fn class(&self) -> AccountClass {
        self.class
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn subgroup(&self) -> &str {
        &self.subgroup
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when the given storage key fields name this account.
    pub fn matches_key(&self, class: &str, group: &str, subgroup: &str, id: &str) -> bool {
        self.class.as_str() == class && self.group == group && self.subgroup == subgroup && self.id == id
    }
}

impl ValueObject for AccountIdentity {}

impl core::fmt::Display for AccountIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}.{}", self.class, self.group, self.subgroup, self.id)
    }
}

impl FromStr for AccountIdentity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 4 {
            return Err(DomainError::validation(format!(
                "account path '{s}' must have 4 segments, found {} (segments may not contain '.')",
                parts.len()
            )));
        }
        if parts.len() < 4 {
            return Err(DomainError::validation(format!(
                "account path '{s}' must have 4 segments, found {}",
                parts.len()
            )));
        }
        if let Some(idx) = parts.iter().position(|p| p.is_empty()) {
            return Err(DomainError::validation(format!(
                "account path '{s}' has an empty segment (index {idx})"
            )));
        }

        let class = parts[0].parse::<AccountClass>()?;
        Ok(Self::new(class, parts[1], parts[2], parts[3]))
    }
}
