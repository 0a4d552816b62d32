//! Login and registration against an `AccountStore`.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::account::{Account, AdminDraft, ProfileFields, UserDraft, normalize_email};
use crate::password::{PasswordError, hash_password, verify_password};
use crate::store::{AccountStore, RegistrationStats, StoreError};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Default ceiling on the number of user-role accounts.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("authentication failed: {0}")]
    Internal(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("please enter a valid email address")]
    InvalidEmailFormat,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters long")]
    WeakPassword,

    #[error("user with this email already exists")]
    DuplicateEmail,

    #[error("registration capacity reached (maximum {0} users)")]
    CapacityExceeded(usize),

    #[error("registration failed: {0}")]
    Internal(String),
}

impl From<StoreError> for RegistrationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateEmail => RegistrationError::DuplicateEmail,
            StoreError::CapacityExceeded(cap) => RegistrationError::CapacityExceeded(cap),
            StoreError::Unavailable(msg) => RegistrationError::Internal(msg),
        }
    }
}

impl From<PasswordError> for RegistrationError {
    fn from(value: PasswordError) -> Self {
        RegistrationError::Internal(value.to_string())
    }
}

/// Registration input as submitted by a client.
///
/// Required fields are optional here so that absence can be reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

/// `local@domain.tld` shape: one `@`, no whitespace, and a dot inside the
/// domain with characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, RegistrationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RegistrationError::MissingField(field)),
    }
}

/// Credential checks and account creation.
#[derive(Debug, Clone)]
pub struct Authenticator<S> {
    store: S,
    capacity: usize,
}

impl<S: AccountStore> Authenticator<S> {
    pub fn new(store: S, capacity: usize) -> Self {
        Self { store, capacity }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check `email` + `password`, returning the account on success.
    pub fn login(&self, email: &str, password: &str) -> Result<Account, LoginError> {
        let email = normalize_email(email);
        let internal = |e: StoreError| LoginError::Internal(e.to_string());

        let Some(account) = self.store.find_by_email(&email).map_err(internal)? else {
            tracing::info!(%email, "login rejected: unknown account");
            return Err(LoginError::InvalidCredentials);
        };
        let Some(hash) = self.store.credential(&email).map_err(internal)? else {
            tracing::warn!(%email, "login rejected: account has no credential");
            return Err(LoginError::InvalidCredentials);
        };

        match verify_password(password, &hash) {
            Ok(true) => {
                tracing::info!(account_id = %account.id, role = %account.role, "login succeeded");
                Ok(account)
            }
            Ok(false) => {
                tracing::info!(%email, "login rejected: password mismatch");
                Err(LoginError::InvalidCredentials)
            }
            Err(e) => {
                tracing::error!(%email, error = %e, "stored credential unusable");
                Err(LoginError::Internal(e.to_string()))
            }
        }
    }

    /// Validate and create a user-role account.
    ///
    /// Checks run in order (required fields, email shape, password length,
    /// duplicate email, capacity) and the first failure is returned.
    pub fn register(
        &self,
        form: RegistrationForm,
        today: NaiveDate,
    ) -> Result<Account, RegistrationError> {
        let name = required(&form.name, "name")?;
        let email = required(&form.email, "email")?;
        let password = match form.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => return Err(RegistrationError::MissingField("password")),
        };

        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(RegistrationError::InvalidEmailFormat);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegistrationError::WeakPassword);
        }

        // Cheap rejections before paying for a hash; the store re-checks both
        // atomically on insert.
        if self.store.find_by_email(&email)?.is_some() {
            return Err(RegistrationError::DuplicateEmail);
        }
        if self.store.stats(self.capacity)?.is_capacity_full {
            return Err(RegistrationError::CapacityExceeded(self.capacity));
        }

        let hash = hash_password(password)?;
        let draft = UserDraft {
            email,
            display_name: name.to_string(),
            profile: form.profile.normalized(),
            registered_on: today,
        };

        match self.store.insert_user(draft, hash, self.capacity) {
            Ok(account) => {
                tracing::info!(account_id = %account.id, "registered new member");
                Ok(account)
            }
            Err(e) => {
                tracing::info!(error = %e, "registration rejected");
                Err(e.into())
            }
        }
    }

    /// Create an administrator account from startup configuration.
    pub fn bootstrap_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<Account, RegistrationError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(RegistrationError::InvalidEmailFormat);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegistrationError::WeakPassword);
        }
        let hash = hash_password(password)?;
        let account = self.store.insert_admin(
            AdminDraft {
                email,
                display_name: name.trim().to_string(),
            },
            hash,
        )?;
        tracing::info!(account_id = %account.id, "administrator account provisioned");
        Ok(account)
    }

    pub fn stats(&self) -> Result<RegistrationStats, StoreError> {
        self.store.stats(self.capacity)
    }
}
