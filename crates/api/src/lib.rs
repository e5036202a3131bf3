//! HTTP surface of the backtest analyser.
//!
//! This crate provides:
//! - Cookie-based login gate
//! - Ad-hoc analysis of uploaded CSV files
//! - Per-user storage and reports over saved backtests

/// Authentication module.
pub mod auth;
/// Error types.
pub mod error;
/// Request handlers.
pub mod handlers;
/// API request/response models.
pub mod models;
/// Route definitions.
pub mod routes;
/// Server configuration and startup.
pub mod server;
/// Application state.
pub mod state;

pub use auth::{AuthConfig, AuthError, AuthState, Claims, CredentialStore};
pub use error::ApiError;
pub use server::{ApiServer, ServerConfig};
pub use state::{AppState, CurrentUser};
