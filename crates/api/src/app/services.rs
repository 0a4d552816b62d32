//! Service wiring: account store, authenticator and session resolver.

use std::sync::Arc;

use anyhow::Context;

use alumni_auth::{AccountStore, Authenticator, InMemoryAccountStore, SessionResolver, TokenCodec};

use crate::config::AppConfig;
use crate::cookies::CookieSettings;

pub type SharedStore = Arc<dyn AccountStore>;

pub struct AppServices {
    pub authenticator: Authenticator<SharedStore>,
    pub sessions: SessionResolver<SharedStore>,
    pub cookies: CookieSettings,
}

impl AppServices {
    pub fn codec(&self) -> &TokenCodec {
        self.sessions.codec()
    }
}

/// Wire services around a fresh in-memory store.
pub fn build_services(config: &AppConfig, codec: TokenCodec) -> anyhow::Result<AppServices> {
    let store: SharedStore = Arc::new(InMemoryAccountStore::new());
    build_services_with_store(config, codec, store)
}

/// Wire services around an existing store (e.g. a durable one).
pub fn build_services_with_store(
    config: &AppConfig,
    codec: TokenCodec,
    store: SharedStore,
) -> anyhow::Result<AppServices> {
    let cookies = CookieSettings {
        max_age: codec.ttl(),
        secure: config.cookie_secure,
    };
    let authenticator = Authenticator::new(store.clone(), config.registration_capacity);

    if let Some(admin) = &config.admin {
        authenticator
            .bootstrap_admin(&admin.email, &admin.name, &admin.password)
            .with_context(|| format!("failed to provision administrator {}", admin.email))?;
    } else {
        tracing::warn!("no administrator configured; admin endpoints are unreachable");
    }

    Ok(AppServices {
        authenticator,
        sessions: SessionResolver::new(codec, store),
        cookies,
    })
}
