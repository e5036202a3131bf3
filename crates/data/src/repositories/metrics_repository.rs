//! Metrics repository: one row per successful upload.

use btlens_domain::metrics::MetricsReport;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Database record for computed metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecord {
    /// Row identifier.
    pub id: i64,
    /// File or backtest name the metrics were computed from.
    pub source_name: String,
    /// First balance.
    pub deposit: Decimal,
    /// Last minus first balance.
    pub gross_profit: Decimal,
    /// Max minus first balance.
    pub max_profit: Decimal,
    /// Min minus first balance.
    pub relative_drawdown: Decimal,
    /// Largest balance drawdown.
    pub max_drawdown: Decimal,
    /// Mean balance drawdown.
    pub mean_drawdown: Decimal,
    /// Largest equity drawdown.
    pub max_equity_drawdown: Decimal,
    /// Mean equity drawdown.
    pub mean_equity_drawdown: Decimal,
    /// Annual growth rate, if defined.
    pub cagr: Option<Decimal>,
    /// Monthly recovery factor, if there was a losing month.
    pub recovery_factor: Option<Decimal>,
    /// Monthly profit factor, if there was a losing month.
    pub profit_factor: Option<Decimal>,
    /// Winning months.
    pub positive_months: i64,
    /// Losing months.
    pub negative_months: i64,
    /// Record creation timestamp (UTC).
    pub created_at: NaiveDateTime,
}

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn optional_decimal_column(row: &SqliteRow, column: &str) -> Result<Option<Decimal>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| {
        Decimal::from_str(&value).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

impl MetricsRecord {
    /// Creates a MetricsRecord from a database row.
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            source_name: row.try_get("source_name")?,
            deposit: decimal_column(row, "deposit")?,
            gross_profit: decimal_column(row, "gross_profit")?,
            max_profit: decimal_column(row, "max_profit")?,
            relative_drawdown: decimal_column(row, "relative_drawdown")?,
            max_drawdown: decimal_column(row, "max_drawdown")?,
            mean_drawdown: decimal_column(row, "mean_drawdown")?,
            max_equity_drawdown: decimal_column(row, "max_equity_drawdown")?,
            mean_equity_drawdown: decimal_column(row, "mean_equity_drawdown")?,
            cagr: optional_decimal_column(row, "cagr")?,
            recovery_factor: optional_decimal_column(row, "recovery_factor")?,
            profit_factor: optional_decimal_column(row, "profit_factor")?,
            positive_months: row.try_get("positive_months")?,
            negative_months: row.try_get("negative_months")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Repository for metric rows. Append-only, no dedup.
#[derive(Clone)]
pub struct MetricsRepository {
    pool: Arc<SqlitePool>,
}

impl MetricsRepository {
    /// Creates a new MetricsRepository.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Appends the metrics of one upload.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn insert(
        &self,
        source_name: &str,
        report: &MetricsReport,
    ) -> Result<MetricsRecord, sqlx::Error> {
        Self::insert_with(self.pool.as_ref(), source_name, report).await
    }

    /// Appends the metrics of one upload through `executor`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn insert_with<'e, E>(
        executor: E,
        source_name: &str,
        report: &MetricsReport,
    ) -> Result<MetricsRecord, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let text = |value: Decimal| value.to_string();
        let optional = |value: Option<Decimal>| value.map(|v| v.to_string());

        let row = sqlx::query(
            r#"
            INSERT INTO metrics (source_name, deposit, gross_profit, max_profit,
                                 relative_drawdown, max_drawdown, mean_drawdown,
                                 max_equity_drawdown, mean_equity_drawdown, cagr,
                                 recovery_factor, profit_factor, positive_months,
                                 negative_months)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            RETURNING *
            "#,
        )
        .bind(source_name)
        .bind(text(report.deposit))
        .bind(text(report.gross_profit))
        .bind(text(report.max_profit))
        .bind(text(report.relative_drawdown))
        .bind(text(report.balance_drawdown.max))
        .bind(text(report.balance_drawdown.mean))
        .bind(text(report.equity_drawdown.max))
        .bind(text(report.equity_drawdown.mean))
        .bind(optional(report.cagr))
        .bind(optional(report.recovery_factor))
        .bind(optional(report.profit_factor))
        .bind(i64::from(report.months.positive))
        .bind(i64::from(report.months.negative))
        .fetch_one(executor)
        .await?;
        MetricsRecord::from_row(&row)
    }

    /// Finds the most recent metric rows.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_recent(&self, limit: i64) -> Result<Vec<MetricsRecord>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM metrics ORDER BY id DESC LIMIT ?1")
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(MetricsRecord::from_row).collect()
    }
}
