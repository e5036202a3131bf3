//! Request handlers.

use crate::error::ApiError;
use crate::models::{
    AnalyzeQuery, BacktestSummary, LoginRequest, RangeQuery, ReportResponse, SessionResponse, UploadQuery,
    UploadResponse,
};
use crate::state::{AppState, CurrentUser};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use btlens_data::{CsvIngestor, IngestConfig};
use btlens_domain::chart::ChartData;
use btlens_domain::entities::EquitySeries;
use btlens_domain::metrics::MetricsReport;
use tracing::{info, instrument};

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// Metrics and chart data for `series` restricted to the requested days.
fn build_report(series: &EquitySeries, query: &RangeQuery) -> Result<ReportResponse, ApiError> {
    let range = series.day_range(query.start, query.end)?;
    let selected = series.filter(&range);
    let metrics = MetricsReport::compute(&selected)?;
    let chart = ChartData::from_series(&selected)?;
    Ok(ReportResponse {
        range,
        rows: selected.len(),
        metrics,
        chart,
    })
}

/// Analyses an uploaded CSV and records its metrics. The CSV itself is not
/// stored.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    body: Bytes,
) -> Result<Json<ReportResponse>, ApiError> {
    let series = state.ingestor.ingest_bytes(&body)?;
    let report = build_report(&series, &query.range())?;
    state
        .db
        .metrics()
        .insert(query.source_name(), &report.metrics)
        .await?;
    info!(rows = report.rows, source = query.source_name(), "Upload analysed");
    Ok(Json(report))
}

/// Issues a session cookie for valid credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.auth.login(&request.username, &request.password)?;
    let claims = state.auth.validate(&token)?;
    let cookie = state.auth.session_cookie(&token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            username: claims.sub,
            expires_at: claims.exp,
        }),
    ))
}

/// Clears the session cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    [(header::SET_COOKIE, state.auth.clear_cookie())]
}

/// Stores an uploaded backtest for the current user and records its metrics.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn upload_backtest(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let name = query.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Backtest name must not be empty".to_string()));
    }

    let series = state.ingestor.ingest_bytes(&body)?;
    let metrics = MetricsReport::compute(&series)?;
    let normalized = CsvIngestor::to_csv(&series)?;

    let (record, _) = state
        .db
        .store_backtest(user.username(), name, &normalized, &metrics)
        .await?;
    info!(id = record.id, rows = series.len(), "Backtest stored");

    Ok(Json(UploadResponse {
        id: record.id,
        backtest_name: record.backtest_name,
        rows: series.len(),
        metrics,
    }))
}

/// Lists the current user's backtests.
pub async fn list_backtests(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<BacktestSummary>>, ApiError> {
    let records = state.db.backtests().find_by_username(user.username()).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Lists every stored backtest.
pub async fn list_all_backtests(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<BacktestSummary>>, ApiError> {
    let records = state.db.backtests().find_all().await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Report over a stored backtest owned by the current user.
pub async fn backtest_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let record = state
        .db
        .backtests()
        .find_by_id(id)
        .await?
        .filter(|record| record.username == user.username())
        .ok_or_else(|| ApiError::NotFound(format!("backtest {id}")))?;

    let series = CsvIngestor::new(IngestConfig::normalized()).ingest_str(&record.data)?;
    Ok(Json(build_report(&series, &query)?))
}
