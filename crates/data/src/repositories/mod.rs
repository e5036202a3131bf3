//! Repository implementations for database persistence.
//!
//! This module provides repository patterns for storing uploaded backtests
//! and the metrics computed from them in a local SQLite file.

mod backtest_repository;
mod metrics_repository;

pub use backtest_repository::{BacktestRecord, BacktestRepository};
pub use metrics_repository::{MetricsRecord, MetricsRepository};

use btlens_domain::metrics::MetricsReport;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Database connection wrapper for repositories.
#[derive(Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    /// Creates a new Database wrapper from a connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Opens (and creates if missing) a SQLite database.
    ///
    /// # Arguments
    /// * `database_url` - SQLite URL, e.g. `sqlite://backtests.db`
    ///
    /// # Errors
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        info!(url = %database_url, "Connected to database");
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates a BacktestRepository instance.
    #[must_use]
    pub fn backtests(&self) -> BacktestRepository {
        BacktestRepository::new(self.pool.clone())
    }

    /// Creates a MetricsRepository instance.
    #[must_use]
    pub fn metrics(&self) -> MetricsRepository {
        MetricsRepository::new(self.pool.clone())
    }

    /// Saves a backtest together with its metrics row in one transaction.
    /// Neither row is kept if either insert fails.
    ///
    /// # Errors
    /// Returns an error if the transaction or either insert fails.
    pub async fn store_backtest(
        &self,
        username: &str,
        backtest_name: &str,
        data: &str,
        report: &MetricsReport,
    ) -> Result<(BacktestRecord, MetricsRecord), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let backtest =
            BacktestRepository::insert_with(&mut *tx, username, backtest_name, data).await?;
        let metrics = MetricsRepository::insert_with(&mut *tx, backtest_name, report).await?;
        tx.commit().await?;
        debug!(id = backtest.id, metrics_id = metrics.id, "Backtest stored");
        Ok((backtest, metrics))
    }

    /// Creates the schema. Safe to run on every start.
    ///
    /// # Errors
    /// Returns an error if the schema statements fail.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("../../migrations/001_initial_schema.sql"))
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btlens_domain::entities::{EquityPoint, EquitySeries};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    async fn open(dir: &tempfile::TempDir) -> Database {
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let db = Database::connect(&url).await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn report() -> MetricsReport {
        let at = |m: u32, d: u32| {
            NaiveDate::from_ymd_opt(2023, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let series = EquitySeries::new(vec![
            EquityPoint::new(at(1, 1), dec!(1000), dec!(1000)),
            EquityPoint::new(at(1, 31), dec!(1100), dec!(1100)),
            EquityPoint::new(at(2, 28), dec!(1045), dec!(1045)),
            EquityPoint::new(at(3, 31), dec!(1200), dec!(1190)),
        ]);
        MetricsReport::compute(&series).unwrap()
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
        assert!(db.backtests().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backtests_append_and_filter_by_user() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;
        let repo = db.backtests();

        let first = repo.insert("user1", "EURUSD H1", "DATE,BALANCE,EQUITY\n").await.unwrap();
        let second = repo.insert("user2", "GBPUSD M15", "DATE,BALANCE,EQUITY\n").await.unwrap();
        // same name again: no uniqueness constraint
        let third = repo.insert("user1", "EURUSD H1", "DATE,BALANCE,EQUITY\n").await.unwrap();
        assert!(first.id < second.id && second.id < third.id);

        let mine = repo.find_by_username("user1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|b| b.username == "user1"));

        assert_eq!(repo.find_all().await.unwrap().len(), 3);
        assert_eq!(repo.find_by_id(second.id).await.unwrap(), Some(second));
        assert_eq!(repo.find_by_id(9_999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_metrics_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;
        let repo = db.metrics();
        let report = report();

        let saved = repo.insert("history.csv", &report).await.unwrap();
        assert_eq!(saved.source_name, "history.csv");
        assert_eq!(saved.deposit, dec!(1000));
        assert_eq!(saved.gross_profit, dec!(200));
        assert_eq!(saved.max_drawdown, report.balance_drawdown.max);
        assert_eq!(saved.profit_factor, report.profit_factor);
        assert_eq!(saved.negative_months, 1);

        repo.insert("history.csv", &report).await.unwrap();
        let recent = repo.find_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].id > recent[1].id);
    }

    #[tokio::test]
    async fn test_store_backtest_writes_both_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;

        let (backtest, metrics) = db
            .store_backtest("user1", "EURUSD H1", "DATE,BALANCE,EQUITY\n", &report())
            .await
            .unwrap();
        assert_eq!(backtest.backtest_name, "EURUSD H1");
        assert_eq!(metrics.source_name, "EURUSD H1");
        assert_eq!(db.backtests().find_all().await.unwrap(), vec![backtest]);
        assert_eq!(db.metrics().find_recent(10).await.unwrap(), vec![metrics]);
    }

    #[tokio::test]
    async fn test_store_backtest_rolls_back_on_metrics_failure() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir).await;
        sqlx::query("DROP TABLE metrics")
            .execute(db.pool())
            .await
            .unwrap();

        let result = db
            .store_backtest("user1", "EURUSD H1", "DATE,BALANCE,EQUITY\n", &report())
            .await;
        assert!(result.is_err());
        assert!(db.backtests().find_all().await.unwrap().is_empty());
    }
}
