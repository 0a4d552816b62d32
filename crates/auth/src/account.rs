//! Account model for portal members and administrators.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use alumni_core::{AccountId, DomainError};

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Account Status
// ─────────────────────────────────────────────────────────────────────────────

/// Membership status of a user-role account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Pending,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Pending => "pending",
            AccountStatus::Suspended => "suspended",
        }
    }
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "pending" => Ok(AccountStatus::Pending),
            "suspended" => Ok(AccountStatus::Suspended),
            _ => Err(DomainError::validation(
                "status must be one of: active, pending, suspended",
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

/// Optional alumni profile details collected at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_passing: Option<String>,
}

impl ProfileFields {
    /// Drop blank values so that `""` and "not provided" are the same thing.
    pub fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            batch: clean(self.batch),
            department: clean(self.department),
            phone: clean(self.phone),
            address: clean(self.address),
            year_of_passing: clean(self.year_of_passing),
        }
    }
}

/// A portal account.
///
/// # Invariants
/// - `id` and `email` are unique across the store.
/// - `email` is stored trimmed and lowercase.
/// - `role` never changes after creation.
/// - `status` and `registered_on` are present only for `Role::User`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub role: Role,
    #[serde(flatten)]
    pub profile: ProfileFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
    #[serde(rename = "registrationDate", skip_serializing_if = "Option::is_none")]
    pub registered_on: Option<NaiveDate>,
}

impl Account {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Canonical form used for email storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ─────────────────────────────────────────────────────────────────────────────
// Drafts
// ─────────────────────────────────────────────────────────────────────────────

/// Validated registration data handed to the store.
///
/// The store assigns the id at insertion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub email: String,
    pub display_name: String,
    pub profile: ProfileFields,
    pub registered_on: NaiveDate,
}

impl UserDraft {
    pub(crate) fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            email: self.email,
            display_name: self.display_name,
            role: Role::User,
            profile: self.profile,
            status: Some(AccountStatus::Active),
            registered_on: Some(self.registered_on),
        }
    }
}

/// Administrator account data (bootstrap only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminDraft {
    pub email: String,
    pub display_name: String,
}

impl AdminDraft {
    pub(crate) fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            email: self.email,
            display_name: self.display_name,
            role: Role::Admin,
            profile: ProfileFields::default(),
            status: None,
            registered_on: None,
        }
    }
}
