//! Route gate: classifies request paths and decides allow vs. redirect.
//!
//! Evaluation is a pure function of the path, the session token (if any),
//! and the clock. It holds no state and may run concurrently.

use chrono::{DateTime, Utc};

use alumni_core::AccountId;

use crate::Role;
use crate::token::TokenCodec;

/// Query parameter carrying the originally requested path on login redirects.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// Access level a path requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    AdminOnly,
    UserOrAdmin,
    /// Any authenticated caller, no specific role.
    Other,
}

/// Identity attached to an allowed request for downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: AccountId,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    MissingToken,
    InvalidToken,
    InsufficientRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Proceed; `identity` is `None` for public paths.
    Allow { identity: Option<Identity> },
    Redirect { location: String, reason: RedirectReason },
}

/// Path classification table plus the redirect targets.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    public_exact: Vec<String>,
    public_prefixes: Vec<String>,
    admin_prefixes: Vec<String>,
    user_prefixes: Vec<String>,
    login_path: String,
    not_authorized: String,
}

impl Default for RoutePolicy {
    /// The portal's route table.
    fn default() -> Self {
        Self::new("/", "/events?error=admin_access_required")
            .public([
                "/",
                "/events",
                "/register-user",
                "/register/1",
                "/register/2",
                "/register/3",
                "/register/4",
            ])
            .public_prefixes(["/api", "/_next/static", "/_next/image", "/favicon.ico", "/images"])
            .admin_prefixes(["/admin"])
            .user_prefixes(["/profile", "/register"])
    }
}

impl RoutePolicy {
    /// Empty table: every path classifies as `Other`.
    pub fn new(login_path: impl Into<String>, not_authorized: impl Into<String>) -> Self {
        Self {
            public_exact: Vec::new(),
            public_prefixes: Vec::new(),
            admin_prefixes: Vec::new(),
            user_prefixes: Vec::new(),
            login_path: login_path.into(),
            not_authorized: not_authorized.into(),
        }
    }

    pub fn public<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.public_exact.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn public_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.public_prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn admin_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.admin_prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn user_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.user_prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Classify `path`. Public wins over admin, admin over user-or-admin.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.public_exact.iter().any(|p| p == path)
            || self.public_prefixes.iter().any(|p| has_prefix(path, p))
        {
            RouteClass::Public
        } else if self.admin_prefixes.iter().any(|p| has_prefix(path, p)) {
            RouteClass::AdminOnly
        } else if self.user_prefixes.iter().any(|p| has_prefix(path, p)) {
            RouteClass::UserOrAdmin
        } else {
            RouteClass::Other
        }
    }

    /// Login entry point carrying `path` as the return target.
    pub fn login_redirect(&self, path: &str) -> String {
        format!(
            "{}?{}={}",
            self.login_path,
            RETURN_URL_PARAM,
            urlencoding::encode(path)
        )
    }

    pub fn not_authorized_redirect(&self) -> &str {
        &self.not_authorized
    }

    pub fn evaluate(
        &self,
        path: &str,
        token: Option<&str>,
        codec: &TokenCodec,
        now: DateTime<Utc>,
    ) -> GateDecision {
        let class = self.classify(path);
        if class == RouteClass::Public {
            return GateDecision::Allow { identity: None };
        }

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return GateDecision::Redirect {
                location: self.login_redirect(path),
                reason: RedirectReason::MissingToken,
            };
        };

        let claims = match codec.decode(token, now) {
            Ok(c) => c,
            Err(_) => {
                return GateDecision::Redirect {
                    location: self.login_redirect(path),
                    reason: RedirectReason::InvalidToken,
                };
            }
        };

        match class {
            // Authenticated but under-privileged: not a login problem.
            RouteClass::AdminOnly if !claims.role.is_admin() => GateDecision::Redirect {
                location: self.not_authorized.clone(),
                reason: RedirectReason::InsufficientRole,
            },
            RouteClass::UserOrAdmin if !matches!(claims.role, Role::User | Role::Admin) => {
                GateDecision::Redirect {
                    location: self.login_redirect(path),
                    reason: RedirectReason::InsufficientRole,
                }
            }
            _ => GateDecision::Allow {
                identity: Some(Identity {
                    subject: claims.sub,
                    role: claims.role,
                }),
            },
        }
    }
}

/// Segment-aware prefix test: `/admin` matches `/admin` and `/admin/x`, not
/// `/administrator`.
fn has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}
