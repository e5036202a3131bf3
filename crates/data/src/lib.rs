//! Data access for backtest histories.
//!
//! This crate provides:
//! - Ingestion configuration (column mappings, encodings, date formats)
//! - CSV decoding and normalisation into equity series
//! - SQLite repositories for saved backtests and computed metrics

/// Ingestion and storage configuration.
pub mod config;
/// CSV ingestion.
pub mod ingest;
/// Database repositories.
pub mod repositories;

pub use config::{ColumnMapping, ConfigError, IngestConfig, IngestPreset, SourceEncoding};
pub use ingest::{CsvIngestor, IngestError};
pub use repositories::Database;
