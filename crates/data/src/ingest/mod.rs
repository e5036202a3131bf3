//! CSV ingestion and normalisation.
//!
//! Uploaded bytes are decoded, parsed with the configured delimiter, their
//! columns renamed to `DATE/BALANCE/EQUITY`, and the rows turned into an
//! [`EquitySeries`](btlens_domain::entities::EquitySeries). Any failure is
//! terminal for that upload.

mod decode;
mod reader;

pub use decode::decode;
pub use reader::{CsvIngestor, rename_headers};

use crate::config::{ConfigError, SourceEncoding};

/// Errors raised while ingesting a CSV upload.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The bytes are not valid in the configured encoding.
    #[error("unable to decode the file as {encoding:?}: {reason}")]
    Decode {
        /// Encoding that was attempted.
        encoding: SourceEncoding,
        /// Decoder message.
        reason: String,
    },
    /// Invalid ingestion configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Malformed CSV.
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    /// A required column is absent.
    #[error("missing column {column} (expected header '{expected}', found {found:?})")]
    MissingColumn {
        /// Canonical column name.
        column: &'static str,
        /// Configured source header.
        expected: String,
        /// Headers present in the file.
        found: Vec<String>,
    },
    /// A date cell does not match the configured format.
    #[error("row {row}: date '{value}' does not match format '{format}'")]
    DateParse {
        /// 1-based data row.
        row: usize,
        /// Offending cell.
        value: String,
        /// Configured format.
        format: String,
    },
    /// A numeric cell could not be parsed.
    #[error("row {row}: {column} value '{value}' is not a number")]
    NumberParse {
        /// 1-based data row.
        row: usize,
        /// Canonical column name.
        column: &'static str,
        /// Offending cell.
        value: String,
    },
    /// The file has a header but no data rows.
    #[error("the file contains no data rows")]
    Empty,
    /// Writing the normalised CSV failed.
    #[error("failed to export CSV: {0}")]
    Export(String),
}
