use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use alumni_auth::{GateDecision, RoutePolicy, TokenCodec};

use crate::context::PrincipalContext;
use crate::cookies;

const USER_ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");
const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct GateState {
    pub codec: TokenCodec,
    pub policy: Arc<RoutePolicy>,
}

/// Route gate: runs before every page handler.
///
/// Token problems never produce an error body; the client is redirected.
pub async fn gate_middleware(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let token = cookies::session_token(&CookieJar::from_headers(req.headers()));

    match state
        .policy
        .evaluate(&path, token.as_deref(), &state.codec, Utc::now())
    {
        GateDecision::Redirect { location, reason } => {
            tracing::debug!(%path, ?reason, %location, "gate redirect");
            Redirect::temporary(&location).into_response()
        }
        GateDecision::Allow { identity: None } => next.run(req).await,
        GateDecision::Allow {
            identity: Some(identity),
        } => {
            let principal = PrincipalContext::from(identity);
            req.extensions_mut().insert(principal.clone());

            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(
                USER_ROLE_HEADER,
                HeaderValue::from_static(principal.role().as_str()),
            );
            if let Ok(id) = HeaderValue::from_str(principal.account_id().as_str()) {
                headers.insert(USER_ID_HEADER, id);
            }
            response
        }
    }
}
