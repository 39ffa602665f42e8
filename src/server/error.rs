// HTTP error mapping
//
// Handlers return `Result<T, ServerError>`. Client errors expose their message
// as `{"detail": ...}`; internal failures are logged and answered with a
// generic message.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials; answered with `WWW-Authenticate: Bearer`
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Placeholder routes kept for API compatibility
    #[error("not implemented")]
    NotImplemented,

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(what) => ServerError::Conflict(what),
            other => ServerError::Store(other),
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ServerError::Unauthorized(e.to_string()),
            AuthError::InvalidToken(ref source) => {
                if let Some(source) = source {
                    tracing::debug!(error = %source, "rejected token");
                }
                ServerError::Unauthorized(e.to_string())
            }
            AuthError::Inactive => ServerError::BadRequest(e.to_string()),
            AuthError::Forbidden => ServerError::Forbidden(e.to_string()),
            AuthError::Store(store) => store.into(),
            AuthError::Hash(_) | AuthError::Task(_) | AuthError::Encode(_) => {
                ServerError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            ServerError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            ServerError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ServerError::NotImplemented => {
                (StatusCode::NOT_IMPLEMENTED, "NotImplementedError".to_owned())
            }
            ServerError::Store(e) => {
                tracing::error!(error = ?e, "store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Internal(m) => {
                tracing::error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };

        let body = Json(json!({ "detail": detail }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
