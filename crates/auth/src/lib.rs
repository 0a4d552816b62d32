//! `alumni-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP. Storage sits behind the
//! `AccountStore` trait; an in-memory implementation is provided.

pub mod account;
pub mod authenticator;
pub mod claims;
pub mod gate;
pub mod password;
pub mod roles;
pub mod session;
pub mod store;
pub mod token;

pub use account::{Account, AccountStatus, ProfileFields, normalize_email};
pub use authenticator::{Authenticator, LoginError, RegistrationError, RegistrationForm};
pub use claims::{SessionClaims, validate_claims};
pub use gate::{GateDecision, Identity, RedirectReason, RouteClass, RoutePolicy};
pub use roles::Role;
pub use session::SessionResolver;
pub use store::{AccountStore, InMemoryAccountStore, RegistrationStats, StoreError};
pub use token::{TokenCodec, TokenError};
