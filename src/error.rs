use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::token::AuthError;

/// Result alias used by handlers, stores and the auth core.
pub type Result<T> = std::result::Result<T, AppError>;

/// AppError
///
/// The service-wide failure taxonomy. Each variant maps to exactly one HTTP status;
/// store and internal failures are logged here and reach the client as opaque 500s.
#[derive(Debug, Error)]
pub enum AppError {
    /// No bearer token on an action that requires an identity.
    #[error("authentication required")]
    Unauthenticated,

    /// A verified identity lacking the required role or ownership.
    #[error("not authorised")]
    Unauthorized,

    /// A bearer token was presented but could not be accepted.
    #[error(transparent)]
    Token(#[from] AuthError),

    /// Bad login. Same signal for unknown identifier and wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request input or a store write was rejected.
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Signing, hashing or task failures.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized | AppError::Token(_) => StatusCode::FORBIDDEN,
            AppError::InvalidCredentials | AppError::ValidationFailure(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    /// Constraint violations are the caller's fault (duplicate username, dangling
    /// post id); anything else means the store itself is unhealthy.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation()
                || db_err.is_foreign_key_violation()
                || db_err.is_check_violation()
            {
                tracing::debug!("Store rejected write: {}", db_err.message());
                return AppError::ValidationFailure("Write rejected".to_string());
            }
        }
        AppError::StoreUnavailable(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    /// The client only learns that the body was unusable; the serde detail is logged.
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::ValidationFailure("Invalid request body".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::ValidationFailure("Invalid query parameters".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Unauthenticated => "Authentication required".to_string(),
            AppError::Unauthorized => "Not authorised".to_string(),
            AppError::Token(AuthError::Expired) => "Token expired".to_string(),
            AppError::Token(e) => {
                tracing::warn!("Rejected bearer token: {}", e);
                "Invalid token".to_string()
            }
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::NotFound(what) => format!("{what} not found"),
            AppError::ValidationFailure(msg) => msg.clone(),
            AppError::StoreUnavailable(detail) => {
                tracing::error!("Store error: {}", detail);
                "Internal server error".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
