use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::DbError;

/// The single error boundary for all handlers. Every route returns
/// `Result<_, ApiError>`; the conversion below maps failures onto the
/// HTTP status codes and `{message, error}` bodies of the wire contract.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Db(DbError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Db(DbError::AlreadyExists(_)) => StatusCode::BAD_REQUEST,
            ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Db(DbError::NotFound(msg)) => ErrorBody {
                message: msg.clone(),
                error: None,
            },
            ApiError::Db(DbError::AlreadyExists(msg)) => ErrorBody {
                message: format!("Already exists: {}", msg),
                error: None,
            },
            ApiError::Db(e) => {
                tracing::error!("store operation failed: {}", e);
                ErrorBody {
                    message: "Store operation failed".to_string(),
                    error: Some(e.to_string()),
                }
            }
            ApiError::BadRequest(msg) => ErrorBody {
                message: msg.clone(),
                error: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
