//! Route definitions.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route(
            "/backtests",
            get(handlers::list_backtests).post(handlers::upload_backtest),
        )
        .route("/backtests/all", get(handlers::list_all_backtests))
        .route("/backtests/{id}/report", get(handlers::backtest_report));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
