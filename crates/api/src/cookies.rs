//! Session cookie construction.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Duration;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "auth-token";

#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub max_age: Duration,
    pub secure: bool,
}

fn base(value: String, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .secure(secure)
        .build()
}

/// Cookie carrying a session token.
pub fn session_cookie(token: String, settings: &CookieSettings) -> Cookie<'static> {
    base(
        token,
        time::Duration::seconds(settings.max_age.num_seconds()),
        settings.secure,
    )
}

/// Cookie that removes the session cookie from the client.
pub fn cleared_session_cookie(settings: &CookieSettings) -> Cookie<'static> {
    base(String::new(), time::Duration::ZERO, settings.secure)
}

/// Session token presented by the client, if any.
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
