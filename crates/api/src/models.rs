//! API request/response models.

use btlens_data::repositories::BacktestRecord;
use btlens_domain::chart::ChartData;
use btlens_domain::metrics::MetricsReport;
use btlens_domain::value_objects::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source name of analyses posted without a name.
pub const DEFAULT_SOURCE_NAME: &str = "upload";

/// Login form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Issued session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub username: String,
    /// Expiry as a Unix timestamp.
    pub expires_at: u64,
}

/// Optional whole-day bounds; omitted bounds select the full history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Query of the analysis endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Source name recorded with the metrics row; defaults to `upload`.
    pub name: Option<String>,
}

impl AnalyzeQuery {
    /// Name under which the metrics row is recorded.
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SOURCE_NAME)
    }

    /// The day bounds of the query.
    #[must_use]
    pub fn range(&self) -> RangeQuery {
        RangeQuery {
            start: self.start,
            end: self.end,
        }
    }
}

/// Query of the upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadQuery {
    /// Backtest name.
    pub name: String,
}

/// Metrics and chart series of one selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub range: DateRange,
    /// Rows inside the range.
    pub rows: usize,
    pub metrics: MetricsReport,
    pub chart: ChartData,
}

/// Result of saving a backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: i64,
    pub backtest_name: String,
    pub rows: usize,
    pub metrics: MetricsReport,
}

/// Listing entry; the CSV body is fetched through the report endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub id: i64,
    pub username: String,
    pub backtest_name: String,
}

impl From<BacktestRecord> for BacktestSummary {
    fn from(record: BacktestRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            backtest_name: record.backtest_name,
        }
    }
}
