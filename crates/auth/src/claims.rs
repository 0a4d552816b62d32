use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use alumni_core::AccountId;

use crate::Role;
use crate::token::TokenError;

/// Claims carried inside a session token.
///
/// Timestamps travel as whole Unix seconds, so constructors truncate
/// sub-second precision up front; a decoded token compares equal to the
/// claims it was minted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the account the token was issued to.
    pub sub: AccountId,

    /// Role of the subject at issuance.
    pub role: Role,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Fails when `now + ttl` falls outside the representable time range.
    pub fn new(
        sub: AccountId,
        role: Role,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(TokenError::LifetimeOutOfRange)?;
        Ok(Self {
            sub,
            role,
            issued_at,
            expires_at,
        })
    }
}

/// Deterministically validate the time window of decoded claims.
///
/// A token is usable strictly before `expires_at`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenError::Malformed);
    }
    if now >= claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}
