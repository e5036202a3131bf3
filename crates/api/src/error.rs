//! API error type and its HTTP mapping.

use crate::auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use btlens_data::IngestError;
use btlens_domain::DomainError;
use tracing::error;

/// Errors returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request parameters.
    #[error("{0}")]
    BadRequest(String),
    /// Unknown resource, or one owned by another user.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Authentication failure.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The upload could not be ingested.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// Metric computation or range selection failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Storage failure.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Ingest(IngestError::Config(_) | IngestError::Export(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Ingest(_) => StatusCode::BAD_REQUEST,
            Self::Domain(DomainError::Conversion(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Domain(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Auth(auth) = self {
            return auth.into_response();
        }

        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "Request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}
