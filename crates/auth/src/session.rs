use chrono::{DateTime, Utc};

use crate::account::Account;
use crate::store::AccountStore;
use crate::token::TokenCodec;

/// Recovers the current account from a session token.
///
/// Every decode failure is collapsed into "not authenticated"; callers never
/// learn whether a token was malformed, forged, or expired.
#[derive(Debug, Clone)]
pub struct SessionResolver<S> {
    codec: TokenCodec,
    store: S,
}

impl<S: AccountStore> SessionResolver<S> {
    pub fn new(codec: TokenCodec, store: S) -> Self {
        Self { codec, store }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// The account behind `token`, if the token verifies and the account
    /// still exists.
    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Option<Account> {
        let claims = match self.codec.decode(token, now) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                return None;
            }
        };

        match self.store.find_by_id(&claims.sub) {
            Ok(Some(account)) => Some(account),
            Ok(None) => {
                tracing::debug!(account_id = %claims.sub, "session subject no longer exists");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "account lookup failed during session resolution");
                None
            }
        }
    }
}
