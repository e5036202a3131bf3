//! Backtest repository for per-user CSV persistence.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use std::sync::Arc;

/// Database record for a saved backtest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktestRecord {
    /// Row identifier.
    pub id: i64,
    /// Owner of the upload.
    pub username: String,
    /// Name given at save time.
    pub backtest_name: String,
    /// Normalised CSV text.
    pub data: String,
}

impl BacktestRecord {
    /// Creates a BacktestRecord from a database row.
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            backtest_name: row.try_get("backtest_name")?,
            data: row.try_get("data")?,
        })
    }
}

/// Repository for saved backtests. Append-only.
#[derive(Clone)]
pub struct BacktestRepository {
    pool: Arc<SqlitePool>,
}

impl BacktestRepository {
    /// Creates a new BacktestRepository.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Appends a backtest.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn insert(
        &self,
        username: &str,
        backtest_name: &str,
        data: &str,
    ) -> Result<BacktestRecord, sqlx::Error> {
        Self::insert_with(self.pool.as_ref(), username, backtest_name, data).await
    }

    /// Appends a backtest through `executor`, e.g. an open transaction.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn insert_with<'e, E>(
        executor: E,
        username: &str,
        backtest_name: &str,
        data: &str,
    ) -> Result<BacktestRecord, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let row = sqlx::query(
            r#"
            INSERT INTO backtests (username, backtest_name, data)
            VALUES (?1, ?2, ?3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(backtest_name)
        .bind(data)
        .fetch_one(executor)
        .await?;
        BacktestRecord::from_row(&row)
    }

    /// Finds a backtest by ID.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<BacktestRecord>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM backtests WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(BacktestRecord::from_row).transpose()
    }

    /// Finds every backtest saved by `username`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<BacktestRecord>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM backtests WHERE username = ?1 ORDER BY id")
            .bind(username)
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(BacktestRecord::from_row).collect()
    }

    /// Finds every saved backtest, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_all(&self) -> Result<Vec<BacktestRecord>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM backtests ORDER BY id")
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(BacktestRecord::from_row).collect()
    }
}
