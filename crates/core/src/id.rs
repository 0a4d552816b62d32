//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an account (user or admin).
///
/// Account ids are human-readable and stable: registered users get a
/// year-scoped sequence (`ALM-2025-001`), bootstrap admins `admin-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Id for the `seq`-th registered user in `year`.
    pub fn sequenced(year: i32, seq: usize) -> Self {
        Self(format!("ALM-{year}-{seq:03}"))
    }

    /// Id for the `n`-th administrator account.
    pub fn admin(n: usize) -> Self {
        Self(format!("admin-{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::invalid_id("AccountId: empty"));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::invalid_id(format!("AccountId: '{s}'")));
        }
        Ok(Self(s.to_string()))
    }
}
