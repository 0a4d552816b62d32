//! Caller resolution for the JSON API.
//!
//! API routes are exempt from the page gate and check the session cookie
//! themselves.

use axum_extra::extract::CookieJar;
use chrono::Utc;

use alumni_auth::Account;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::cookies;

/// The account behind the request's session cookie, if it is still valid.
pub fn current_account(services: &AppServices, jar: &CookieJar) -> Option<Account> {
    let token = cookies::session_token(jar)?;
    services.sessions.resolve(&token, Utc::now())
}

/// Require an administrator caller. Anonymous callers get the same 403.
pub fn require_admin(services: &AppServices, jar: &CookieJar) -> Result<Account, ApiError> {
    match current_account(services, jar) {
        Some(account) if account.is_admin() => Ok(account),
        _ => Err(ApiError::Authorization("Admin access required".to_string())),
    }
}
