use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use alumni_auth::{LoginError, RegistrationError, StoreError};

/// Error surface of the JSON API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("{message}")]
    Authentication { code: &'static str, message: String },

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Capacity(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::Authentication {
            code: "not_authenticated",
            message: "Not authenticated".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Capacity(_) => StatusCode::BAD_REQUEST,
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation { code, message } | Self::Authentication { code, message } => {
                json_error(status, code, message)
            }
            Self::Authorization(msg) => json_error(status, "admin_required", msg),
            Self::NotFound(msg) => json_error(status, "not_found", msg),
            Self::Capacity(msg) => json_error(status, "capacity_reached", msg),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                let message = if cfg!(debug_assertions) {
                    detail
                } else {
                    "internal server error".to_string()
                };
                json_error(status, "internal_error", message)
            }
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(value: LoginError) -> Self {
        match value {
            LoginError::InvalidCredentials => Self::Authentication {
                code: "invalid_credentials",
                message: "Invalid email or password".to_string(),
            },
            LoginError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(value: RegistrationError) -> Self {
        let message = value.to_string();
        match value {
            RegistrationError::MissingField(_) => Self::validation("missing_field", message),
            RegistrationError::InvalidEmailFormat => Self::validation("invalid_email", message),
            RegistrationError::WeakPassword => Self::validation("weak_password", message),
            RegistrationError::DuplicateEmail => Self::validation("duplicate_email", message),
            RegistrationError::CapacityExceeded(_) => Self::Capacity(message),
            RegistrationError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Internal(format!("background task failed: {value}"))
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
