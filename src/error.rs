use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure talking to the remote database.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("row decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unknown column {column} on table {table}")]
    UnknownColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    #[error("unique constraint {0} violated")]
    Duplicate(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        ApiError::Internal(e.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RemoteError> for ApiError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Duplicate(_) => ApiError::Conflict("Already exists".into()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            ApiError::Unauthorized(msg) => ("UNAUTHORIZED", msg),
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg),
            ApiError::Conflict(msg) => ("CONFLICT", msg),
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                ("INTERNAL", "An internal error occurred".to_string())
            }
        };
        (status, Json(ErrorBody { error: ErrorDetail { code, message } })).into_response()
    }
}
