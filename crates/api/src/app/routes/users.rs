use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    routing::{get, patch},
};
use axum_extra::extract::CookieJar;

use alumni_auth::{AccountStatus, AccountStore};
use alumni_core::AccountId;

use crate::app::routes::auth::invalid_body;
use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id/status", patch(update_status))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Result<Json<dto::UsersResponse>, ApiError> {
    authz::require_admin(&services, &jar)?;
    let users = services.authenticator.store().list_users()?;
    Ok(Json(dto::UsersResponse::new(users)))
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<dto::MessageResponse>, ApiError> {
    let admin = authz::require_admin(&services, &jar)?;
    let Json(body) = payload.map_err(invalid_body)?;

    let status = body
        .status
        .as_deref()
        .and_then(|s| s.parse::<AccountStatus>().ok())
        .ok_or_else(|| {
            ApiError::validation(
                "invalid_status",
                "Invalid status. Must be active, pending, or suspended",
            )
        })?;

    let not_found = || ApiError::NotFound("User not found".to_string());
    let id: AccountId = id.parse().map_err(|_| not_found())?;
    if !services.authenticator.store().update_status(&id, status)? {
        return Err(not_found());
    }

    tracing::info!(admin_id = %admin.id, account_id = %id, %status, "account status updated");
    Ok(Json(dto::MessageResponse::ok(format!(
        "User status updated to {status}"
    ))))
}
