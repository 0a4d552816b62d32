//! Account + credential storage.
//!
//! `AccountStore` is the storage capability the authenticator and HTTP layer
//! depend on; `InMemoryAccountStore` is the process-local implementation.
//! Every mutation runs under one exclusive lock, so "check duplicate, check
//! capacity, insert" is a single atomic step.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Datelike;
use serde::Serialize;
use thiserror::Error;

use alumni_core::AccountId;

use crate::account::{Account, AccountStatus, AdminDraft, UserDraft, normalize_email};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("registration capacity reached (maximum {0} users)")]
    CapacityExceeded(usize),

    #[error("account store unavailable: {0}")]
    Unavailable(String),
}

/// Registration counters derived from the user-role accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStats {
    pub total_users: usize,
    pub active_users: usize,
    pub pending_users: usize,
    pub available_slots: usize,
    pub is_capacity_full: bool,
}

impl RegistrationStats {
    pub fn from_accounts<'a>(accounts: impl IntoIterator<Item = &'a Account>, capacity: usize) -> Self {
        let mut total_users = 0;
        let mut active_users = 0;
        let mut pending_users = 0;
        for account in accounts.into_iter().filter(|a| a.is_user()) {
            total_users += 1;
            match account.status {
                Some(AccountStatus::Active) => active_users += 1,
                Some(AccountStatus::Pending) => pending_users += 1,
                _ => {}
            }
        }
        Self {
            total_users,
            active_users,
            pending_users,
            available_slots: capacity.saturating_sub(total_users),
            is_capacity_full: total_users >= capacity,
        }
    }
}

/// Storage capability for accounts and their password hashes.
///
/// Emails passed in are compared in normalized (trimmed, lowercase) form.
pub trait AccountStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Insert a user-role account if its email is free and the user count is
    /// below `capacity`. The store assigns the account id.
    fn insert_user(
        &self,
        draft: UserDraft,
        password_hash: String,
        capacity: usize,
    ) -> Result<Account, StoreError>;

    /// Insert an administrator account if its email is free.
    fn insert_admin(&self, draft: AdminDraft, password_hash: String) -> Result<Account, StoreError>;

    /// Replace the password hash of an existing account. Returns `false` when
    /// no account has this email.
    fn set_credential(&self, email: &str, password_hash: String) -> Result<bool, StoreError>;

    fn credential(&self, email: &str) -> Result<Option<String>, StoreError>;

    /// Set the status of a user-role account. Returns `false` when the id is
    /// unknown or belongs to an administrator.
    fn update_status(&self, id: &AccountId, status: AccountStatus) -> Result<bool, StoreError>;

    /// All user-role accounts in registration order.
    fn list_users(&self) -> Result<Vec<Account>, StoreError>;

    fn stats(&self, capacity: usize) -> Result<RegistrationStats, StoreError>;
}

impl<S> AccountStore for Arc<S>
where
    S: AccountStore + ?Sized,
{
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        (**self).find_by_email(email)
    }

    fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        (**self).find_by_id(id)
    }

    fn insert_user(
        &self,
        draft: UserDraft,
        password_hash: String,
        capacity: usize,
    ) -> Result<Account, StoreError> {
        (**self).insert_user(draft, password_hash, capacity)
    }

    fn insert_admin(&self, draft: AdminDraft, password_hash: String) -> Result<Account, StoreError> {
        (**self).insert_admin(draft, password_hash)
    }

    fn set_credential(&self, email: &str, password_hash: String) -> Result<bool, StoreError> {
        (**self).set_credential(email, password_hash)
    }

    fn credential(&self, email: &str) -> Result<Option<String>, StoreError> {
        (**self).credential(email)
    }

    fn update_status(&self, id: &AccountId, status: AccountStatus) -> Result<bool, StoreError> {
        (**self).update_status(id, status)
    }

    fn list_users(&self) -> Result<Vec<Account>, StoreError> {
        (**self).list_users()
    }

    fn stats(&self, capacity: usize) -> Result<RegistrationStats, StoreError> {
        (**self).stats(capacity)
    }
}

#[derive(Debug, Default)]
struct Accounts {
    /// Insertion order; indexes below point into this vec.
    accounts: Vec<Account>,
    by_email: HashMap<String, usize>,
    by_id: HashMap<AccountId, usize>,
    credentials: HashMap<String, String>,
}

impl Accounts {
    fn user_count(&self) -> usize {
        self.accounts.iter().filter(|a| a.is_user()).count()
    }

    fn admin_count(&self) -> usize {
        self.accounts.iter().filter(|a| a.is_admin()).count()
    }

    /// First free id produced by `make`, starting at `seq`.
    fn free_id(&self, mut seq: usize, make: impl Fn(usize) -> AccountId) -> AccountId {
        loop {
            let id = make(seq);
            if !self.by_id.contains_key(&id) {
                return id;
            }
            seq += 1;
        }
    }

    fn push(&mut self, account: Account, password_hash: String) -> Account {
        let idx = self.accounts.len();
        self.by_email.insert(account.email.clone(), idx);
        self.by_id.insert(account.id.clone(), idx);
        self.credentials.insert(account.email.clone(), password_hash);
        self.accounts.push(account.clone());
        account
    }
}

/// In-memory account store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<Accounts>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Accounts>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Accounts>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl AccountStore for InMemoryAccountStore {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .by_email
            .get(&normalize_email(email))
            .map(|&idx| inner.accounts[idx].clone()))
    }

    fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        let inner = self.read()?;
        Ok(inner.by_id.get(id).map(|&idx| inner.accounts[idx].clone()))
    }

    fn insert_user(
        &self,
        mut draft: UserDraft,
        password_hash: String,
        capacity: usize,
    ) -> Result<Account, StoreError> {
        draft.email = normalize_email(&draft.email);

        let mut inner = self.write()?;
        if inner.by_email.contains_key(&draft.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let users = inner.user_count();
        if users >= capacity {
            return Err(StoreError::CapacityExceeded(capacity));
        }

        let year = draft.registered_on.year();
        let id = inner.free_id(users + 1, |seq| AccountId::sequenced(year, seq));
        Ok(inner.push(draft.into_account(id), password_hash))
    }

    fn insert_admin(
        &self,
        mut draft: AdminDraft,
        password_hash: String,
    ) -> Result<Account, StoreError> {
        draft.email = normalize_email(&draft.email);

        let mut inner = self.write()?;
        if inner.by_email.contains_key(&draft.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let id = inner.free_id(inner.admin_count() + 1, AccountId::admin);
        Ok(inner.push(draft.into_account(id), password_hash))
    }

    fn set_credential(&self, email: &str, password_hash: String) -> Result<bool, StoreError> {
        let email = normalize_email(email);
        let mut inner = self.write()?;
        if !inner.by_email.contains_key(&email) {
            return Ok(false);
        }
        inner.credentials.insert(email, password_hash);
        Ok(true)
    }

    fn credential(&self, email: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.credentials.get(&normalize_email(email)).cloned())
    }

    fn update_status(&self, id: &AccountId, status: AccountStatus) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let Some(&idx) = inner.by_id.get(id) else {
            return Ok(false);
        };
        let account = &mut inner.accounts[idx];
        if !account.is_user() {
            return Ok(false);
        }
        account.status = Some(status);
        Ok(true)
    }

    fn list_users(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .read()?
            .accounts
            .iter()
            .filter(|a| a.is_user())
            .cloned()
            .collect())
    }

    fn stats(&self, capacity: usize) -> Result<RegistrationStats, StoreError> {
        Ok(RegistrationStats::from_accounts(&self.read()?.accounts, capacity))
    }
}
