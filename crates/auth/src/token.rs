//! Session token codec.
//!
//! Tokens have the compact JWS shape `header.payload.signature`, each segment
//! base64url without padding. The signature is HMAC-SHA256 over
//! `header "." payload` keyed with the process-wide signing secret.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use alumni_core::{AccountId, DomainError};

use crate::Role;
use crate::claims::{SessionClaims, validate_claims};

type HmacSha256 = Hmac<Sha256>;

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Lifetime of a freshly issued token, in seconds (24 hours).
pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token lifetime is out of range")]
    LifetimeOutOfRange,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Encodes and verifies session tokens with a single signing secret.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    ttl: Duration,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, DomainError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(DomainError::validation("token signing secret must not be empty"));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|_| DomainError::validation("unusable token signing secret"))?;
        Ok(Self {
            mac,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `sub` valid from `now` for the configured ttl.
    pub fn issue(
        &self,
        sub: AccountId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<(String, SessionClaims), TokenError> {
        let claims = SessionClaims::new(sub, role, now, self.ttl)?;
        let token = self.encode(&claims)?;
        Ok((token, claims))
    }

    pub fn encode(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
        let header = URL_SAFE_NO_PAD.encode(HEADER_JSON);
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&header, &payload));
        Ok(format!("{header}.{payload}.{signature}"))
    }

    /// Verify integrity and expiry, returning the embedded claims.
    ///
    /// The signature is checked before the payload is parsed.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = parts.as_slice() else {
            return Err(TokenError::Malformed);
        };

        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let expected = self.sign(header, payload);
        if !bool::from(expected.as_slice().ct_eq(&provided)) {
            return Err(TokenError::BadSignature);
        }

        let header: Header = decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(TokenError::Malformed);
        }

        let claims: SessionClaims = decode_segment(payload)?;
        validate_claims(&claims, now)?;
        Ok(claims)
    }

    fn sign(&self, header: &str, payload: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "unit-test-signing-secret-0123456789";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    #[test]
    fn issue_then_decode_returns_same_claims() {
        let codec = codec();
        let (token, claims) = codec
            .issue(AccountId::sequenced(2025, 2), Role::User, t0())
            .unwrap();
        let decoded = codec.decode(&token, t0()).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.expires_at - decoded.issued_at, Duration::seconds(DEFAULT_TTL_SECS));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(TokenCodec::new("").is_err());
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", codec());
        assert!(!rendered.contains(SECRET));
    }

    #[test]
    fn signature_is_not_an_encoding_of_the_secret() {
        let (token, _) = codec().issue(AccountId::admin(1), Role::Admin, t0()).unwrap();
        let signature = token.rsplit('.').next().unwrap();
        let raw = URL_SAFE_NO_PAD.decode(signature).unwrap();
        assert_eq!(raw.len(), 32);
        assert!(!String::from_utf8_lossy(&raw).contains(SECRET));
    }

    #[test]
    fn wrong_secret_fails_signature_check() {
        let (token, _) = codec().issue(AccountId::admin(1), Role::Admin, t0()).unwrap();
        let other = TokenCodec::new("another-secret").unwrap();
        assert_eq!(other.decode(&token, t0()), Err(TokenError::BadSignature));
    }

    #[test]
    fn part_count_must_be_three() {
        let codec = codec();
        assert_eq!(codec.decode("", t0()), Err(TokenError::Malformed));
        assert_eq!(codec.decode("a.b", t0()), Err(TokenError::Malformed));
        assert_eq!(codec.decode("a.b.c.d", t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn expired_token_with_valid_signature_is_rejected() {
        let codec = codec().with_ttl(Duration::minutes(5));
        let (token, claims) = codec.issue(AccountId::admin(1), Role::Admin, t0()).unwrap();
        assert!(codec.decode(&token, claims.expires_at - Duration::seconds(1)).is_ok());
        assert_eq!(
            codec.decode(&token, claims.expires_at + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn issue_with_unrepresentable_lifetime_fails_cleanly() {
        let codec = codec().with_ttl(Duration::days(100_000_000));
        assert_eq!(
            codec.issue(AccountId::admin(1), Role::Admin, t0()).unwrap_err(),
            TokenError::LifetimeOutOfRange
        );
    }

    #[test]
    fn forged_role_is_rejected() {
        let codec = codec();
        let (token, claims) = codec
            .issue(AccountId::sequenced(2025, 2), Role::User, t0())
            .unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = SessionClaims { role: Role::Admin, ..claims };
        parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        assert_eq!(codec.decode(&parts.join("."), t0()), Err(TokenError::BadSignature));
    }

    #[test]
    fn unsigned_algorithm_header_is_rejected() {
        // A correctly signed token whose header claims a different algorithm.
        let codec = codec();
        let claims = SessionClaims::new(AccountId::admin(1), Role::Admin, t0(), codec.ttl()).unwrap();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let signature = URL_SAFE_NO_PAD.encode(codec.sign(&header, &payload));
        let token = format!("{header}.{payload}.{signature}");
        assert_eq!(codec.decode(&token, t0()), Err(TokenError::Malformed));
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::User), Just(Role::Admin)]
    }

    proptest! {
        #[test]
        fn roundtrip_preserves_claims(
            subject in "[A-Za-z0-9-]{1,24}",
            role in role_strategy(),
            issued in 1_000_000_000i64..4_000_000_000i64,
            ttl_secs in 1i64..1_000_000i64,
        ) {
            let codec = codec();
            let now = DateTime::from_timestamp(issued, 0).unwrap();
            let claims = SessionClaims::new(
                subject.parse().unwrap(),
                role,
                now,
                Duration::seconds(ttl_secs),
            ).unwrap();
            let token = codec.encode(&claims).unwrap();
            prop_assert_eq!(codec.decode(&token, now).unwrap(), claims);
        }

        #[test]
        fn any_single_character_change_is_detected(
            seed in any::<prop::sample::Index>(),
            replacement in prop::sample::select(
                "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.".chars().collect::<Vec<_>>()
            ),
        ) {
            let codec = codec();
            let (token, _) = codec.issue(AccountId::sequenced(2025, 9), Role::User, t0()).unwrap();

            // Restrict mutations to the payload and signature segments.
            let start = token.find('.').unwrap() + 1;
            let idx = start + seed.index(token.len() - start);
            let original = token.as_bytes()[idx] as char;
            prop_assume!(original != replacement && original != '.');

            let mut mutated = token.clone();
            mutated.replace_range(idx..idx + 1, &replacement.to_string());

            let result = codec.decode(&mutated, t0());
            prop_assert!(
                matches!(result, Err(TokenError::BadSignature) | Err(TokenError::Malformed)),
                "mutation at {} accepted: {:?}", idx, result
            );
        }
    }
}
