//! Process configuration, read once at startup.

use std::net::SocketAddr;

use anyhow::{Context, bail};
use chrono::Duration;

use alumni_auth::authenticator::DEFAULT_CAPACITY;
use alumni_auth::token::DEFAULT_TTL_SECS;

const SECRET_VAR: &str = "AUTH_TOKEN_SECRET";
const MIN_RECOMMENDED_SECRET_LEN: usize = 32;
const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Administrator account created at startup.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl core::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// HMAC key for session tokens. Never logged.
    pub token_secret: String,
    pub session_ttl: Duration,
    pub registration_capacity: usize,
    /// Adds the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,
    pub admin: Option<AdminBootstrap>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("registration_capacity", &self.registration_capacity)
            .field("cookie_secure", &self.cookie_secure)
            .field("admin", &self.admin)
            .finish()
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `AUTH_TOKEN_SECRET` | required |
    /// | `BIND_ADDR` | `0.0.0.0:8080` |
    /// | `SESSION_TTL_SECS` | `86400` |
    /// | `REGISTRATION_CAPACITY` | `1000` |
    /// | `COOKIE_SECURE` | `false` |
    /// | `ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_NAME` | no bootstrap admin |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token_secret = match var(SECRET_VAR) {
            Some(s) => s,
            None => bail!("{SECRET_VAR} must be set to a non-empty signing secret"),
        };
        if token_secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                min_len = MIN_RECOMMENDED_SECRET_LEN,
                "{SECRET_VAR} is shorter than recommended"
            );
        }

        let bind_addr = match var("BIND_ADDR") {
            Some(v) => v.parse().with_context(|| format!("BIND_ADDR is not a socket address: {v}"))?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let ttl_secs: i64 = match var("SESSION_TTL_SECS") {
            Some(v) => v.parse().with_context(|| format!("SESSION_TTL_SECS is not an integer: {v}"))?,
            None => DEFAULT_TTL_SECS,
        };
        if !(1..=MAX_SESSION_TTL_SECS).contains(&ttl_secs) {
            bail!("SESSION_TTL_SECS must be between 1 and {MAX_SESSION_TTL_SECS}");
        }
        let session_ttl = Duration::try_seconds(ttl_secs)
            .with_context(|| format!("SESSION_TTL_SECS is out of range: {ttl_secs}"))?;

        let registration_capacity = match var("REGISTRATION_CAPACITY") {
            Some(v) => v
                .parse()
                .with_context(|| format!("REGISTRATION_CAPACITY is not an integer: {v}"))?,
            None => DEFAULT_CAPACITY,
        };

        let cookie_secure = match var("COOKIE_SECURE") {
            Some(v) => v
                .parse::<bool>()
                .with_context(|| format!("COOKIE_SECURE must be true or false: {v}"))?,
            None => false,
        };

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                email,
                password,
                name: var("ADMIN_NAME").unwrap_or_else(|| "Admin User".to_string()),
            }),
            (None, None) => None,
            _ => bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            bind_addr,
            token_secret,
            session_ttl,
            registration_capacity,
            cookie_secure,
            admin,
        })
    }

    /// Defaults with an explicit secret; used by tests and embedders.
    pub fn for_tests(token_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            token_secret: token_secret.into(),
            session_ttl: Duration::seconds(DEFAULT_TTL_SECS),
            registration_capacity: DEFAULT_CAPACITY,
            cookie_secure: false,
            admin: None,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.registration_capacity = capacity;
        self
    }

    pub fn with_admin(mut self, email: &str, name: &str, password: &str) -> Self {
        self.admin = Some(AdminBootstrap {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        });
        self
    }
}
