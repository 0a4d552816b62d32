use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use alumni_auth::RegistrationForm;

use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::{authz, cookies};

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/register", post(register))
        .route("/stats", get(stats))
}

pub(crate) fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::validation("invalid_body", rejection.body_text())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    payload: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<dto::LoginResponse>), ApiError> {
    let Json(body) = payload.map_err(invalid_body)?;
    let Some((email, password)) = body.credentials() else {
        return Err(ApiError::validation(
            "missing_fields",
            "Email and password are required",
        ));
    };
    let (email, password) = (email.to_string(), password.to_string());

    // Password verification is CPU-bound.
    let worker = services.clone();
    let account =
        tokio::task::spawn_blocking(move || worker.authenticator.login(&email, &password)).await??;

    let (token, claims) = services
        .codec()
        .issue(account.id.clone(), account.role, Utc::now())
        .map_err(|e| ApiError::Internal(format!("failed to issue session token: {e}")))?;
    tracing::debug!(account_id = %claims.sub, expires_at = %claims.expires_at, "session issued");

    let jar = jar.add(cookies::session_cookie(token, &services.cookies));
    let redirect_url = if account.is_admin() { "/admin" } else { "/events" };

    Ok((
        jar,
        Json(dto::LoginResponse {
            success: true,
            user: account,
            redirect_url,
        }),
    ))
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> (CookieJar, Json<dto::MessageResponse>) {
    (
        jar.add(cookies::cleared_session_cookie(&services.cookies)),
        Json(dto::MessageResponse::ok("Logged out successfully")),
    )
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Result<Json<dto::UserResponse>, ApiError> {
    let account = authz::current_account(&services, &jar).ok_or_else(ApiError::not_authenticated)?;
    Ok(Json(dto::UserResponse {
        success: true,
        user: account,
    }))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegistrationForm>, JsonRejection>,
) -> Result<Json<dto::RegisterResponse>, ApiError> {
    let Json(form) = payload.map_err(invalid_body)?;
    let today = Utc::now().date_naive();

    let worker = services.clone();
    let account =
        tokio::task::spawn_blocking(move || worker.authenticator.register(form, today)).await??;

    Ok(Json(dto::RegisterResponse {
        success: true,
        message: "Registration successful",
        user: account,
    }))
}

pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Result<Json<dto::StatsResponse>, ApiError> {
    authz::require_admin(&services, &jar)?;
    let stats = services.authenticator.stats()?;
    Ok(Json(dto::StatsResponse {
        success: true,
        stats,
    }))
}
