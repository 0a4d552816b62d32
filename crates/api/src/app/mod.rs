//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: account store, authenticator and session resolver
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use alumni_auth::{RoutePolicy, TokenCodec};

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let codec = TokenCodec::new(config.token_secret.as_bytes())?.with_ttl(config.session_ttl);
    let services = Arc::new(services::build_services(config, codec.clone())?);

    let gate_state = middleware::GateState {
        codec,
        policy: Arc::new(RoutePolicy::default()),
    };

    // Everything except the health probe passes through the route gate; the
    // JSON API is exempt by policy and authorizes per handler.
    let gated = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            gate_state,
            middleware::gate_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(gated)
        .layer(ServiceBuilder::new()))
}
