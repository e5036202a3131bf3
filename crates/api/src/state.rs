//! Application state.

use crate::auth::{AuthState, Claims};
use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use btlens_data::{CsvIngestor, Database, IngestConfig};
use std::sync::Arc;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthState,
    pub ingestor: Arc<CsvIngestor>,
}

impl AppState {
    /// Creates the state.
    #[must_use]
    pub fn new(db: Database, auth: AuthState, ingest: IngestConfig) -> Self {
        Self {
            db,
            auth,
            ingestor: Arc::new(CsvIngestor::new(ingest)),
        }
    }
}

/// A request carrying a valid session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    /// The logged-in username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.0.sub
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .auth
            .authenticate(&parts.headers)
            .map(CurrentUser)
            .map_err(ApiError::from)
    }
}
