//! Ingestion and storage configuration.
//!
//! Column names, encodings, delimiters and date formats used to be literals
//! scattered across dashboards; they are now one [`IngestConfig`], built from a
//! named [`IngestPreset`], a JSON file, or environment overrides.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Canonical name of the timestamp column.
pub const CANONICAL_DATE: &str = "DATE";
/// Canonical name of the balance column.
pub const CANONICAL_BALANCE: &str = "BALANCE";
/// Canonical name of the equity column.
pub const CANONICAL_EQUITY: &str = "EQUITY";

/// Date format of normalised exports.
pub const NORMALIZED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default SQLite location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://backtests.db";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Unrecognised preset name.
    #[error("unknown ingest preset '{0}' (expected mt5, mt5-utf8, capital or normalized)")]
    UnknownPreset(String),
    /// Unrecognised encoding name.
    #[error("unknown encoding '{0}' (expected utf-8, latin-1, utf-8-latin1 or utf-16)")]
    UnknownEncoding(String),
    /// Delimiters must be a single ASCII character.
    #[error("delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(String),
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for [`IngestConfig`].
    #[error("invalid ingest configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Text encoding of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceEncoding {
    /// Strict UTF-8.
    Utf8,
    /// ISO-8859-1.
    Latin1,
    /// UTF-8, falling back to Latin-1 when the bytes are not valid UTF-8.
    Utf8WithLatin1Fallback,
    /// UTF-16, byte order taken from the BOM (little-endian without one).
    Utf16,
}

impl FromStr for SourceEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            "utf-8-latin1" | "utf8_with_latin1_fallback" | "auto" => {
                Ok(Self::Utf8WithLatin1Fallback)
            }
            "utf-16" | "utf16" => Ok(Self::Utf16),
            other => Err(ConfigError::UnknownEncoding(other.to_string())),
        }
    }
}

/// Maps source column headers onto the canonical columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Source header of the timestamp column.
    pub date: String,
    /// Source header of the balance column.
    pub balance: String,
    /// Source header of the equity column; equity mirrors balance when absent.
    #[serde(default)]
    pub equity: Option<String>,
}

impl ColumnMapping {
    /// Bracketed headers of trading-terminal history exports.
    #[must_use]
    pub fn bracketed() -> Self {
        Self {
            date: "<DATE>".to_string(),
            balance: "<BALANCE>".to_string(),
            equity: Some("<EQUITY>".to_string()),
        }
    }

    /// `Date/Capital` capital reports.
    #[must_use]
    pub fn capital() -> Self {
        Self {
            date: "Date".to_string(),
            balance: "Capital".to_string(),
            equity: None,
        }
    }

    /// Canonical headers, as written by the normalised export.
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            date: CANONICAL_DATE.to_string(),
            balance: CANONICAL_BALANCE.to_string(),
            equity: Some(CANONICAL_EQUITY.to_string()),
        }
    }
}

/// Named ingestion layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngestPreset {
    /// `<DATE>/<BALANCE>/<EQUITY>`, UTF-16, tab separated.
    Mt5,
    /// `<DATE>/<BALANCE>/<EQUITY>`, UTF-8 with Latin-1 fallback, tab separated.
    Mt5Utf8,
    /// `Date/Capital/Drawdown`, comma separated, `%Y.%m.%d %H.%M` dates.
    Capital,
    /// Canonical headers and ISO-like dates.
    Normalized,
}

impl FromStr for IngestPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mt5" => Ok(Self::Mt5),
            "mt5-utf8" | "mt5_utf8" => Ok(Self::Mt5Utf8),
            "capital" => Ok(Self::Capital),
            "normalized" | "normalised" => Ok(Self::Normalized),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

/// How an uploaded CSV is decoded and interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub encoding: SourceEncoding,
    /// Field delimiter; must be ASCII.
    pub delimiter: char,
    /// `chrono` format string of the date column.
    pub date_format: String,
    pub columns: ColumnMapping,
}

impl IngestConfig {
    /// Builds the configuration of a preset.
    #[must_use]
    pub fn preset(preset: IngestPreset) -> Self {
        match preset {
            IngestPreset::Mt5 => Self {
                encoding: SourceEncoding::Utf16,
                delimiter: '\t',
                date_format: "%Y.%m.%d %H:%M".to_string(),
                columns: ColumnMapping::bracketed(),
            },
            IngestPreset::Mt5Utf8 => Self {
                encoding: SourceEncoding::Utf8WithLatin1Fallback,
                delimiter: '\t',
                date_format: "%Y.%m.%d %H:%M".to_string(),
                columns: ColumnMapping::bracketed(),
            },
            IngestPreset::Capital => Self {
                encoding: SourceEncoding::Utf8WithLatin1Fallback,
                delimiter: ',',
                date_format: "%Y.%m.%d %H.%M".to_string(),
                columns: ColumnMapping::capital(),
            },
            IngestPreset::Normalized => Self::normalized(),
        }
    }

    /// The layout produced by [`crate::ingest::CsvIngestor::to_csv`].
    #[must_use]
    pub fn normalized() -> Self {
        Self {
            encoding: SourceEncoding::Utf8,
            delimiter: ',',
            date_format: NORMALIZED_DATE_FORMAT.to_string(),
            columns: ColumnMapping::canonical(),
        }
    }

    /// The delimiter as a byte for the CSV reader.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidDelimiter`] for non-ASCII delimiters.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ConfigError::InvalidDelimiter(self.delimiter.to_string()))
        }
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.delimiter_byte()?;
        Ok(config)
    }

    /// Builds the configuration from the environment.
    ///
    /// `BTLENS_INGEST_CONFIG` names a JSON file that wins outright. Otherwise
    /// `BTLENS_INGEST_PRESET` (default `mt5`) is loaded and
    /// `BTLENS_ENCODING`, `BTLENS_DELIMITER` and `BTLENS_DATE_FORMAT` override
    /// single fields.
    ///
    /// # Errors
    /// Returns an error for unknown names or unreadable files.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = env::var("BTLENS_INGEST_CONFIG") {
            debug!(path = %path, "Loading ingest configuration file");
            return Self::from_json_file(path);
        }

        let preset = env::var("BTLENS_INGEST_PRESET")
            .map(|p| p.parse::<IngestPreset>())
            .unwrap_or(Ok(IngestPreset::Mt5))?;
        let mut config = Self::preset(preset);

        if let Ok(encoding) = env::var("BTLENS_ENCODING") {
            config.encoding = encoding.parse()?;
        }
        if let Ok(delimiter) = env::var("BTLENS_DELIMITER") {
            config.delimiter = parse_delimiter(&delimiter)?;
        }
        if let Ok(format) = env::var("BTLENS_DATE_FORMAT") {
            config.date_format = format;
        }
        debug!(?preset, ?config, "Ingest configuration loaded");
        Ok(config)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::preset(IngestPreset::Mt5)
    }
}

/// Parses a delimiter setting; `\t` and `tab` denote a tab.
///
/// # Errors
/// Returns [`ConfigError::InvalidDelimiter`] unless the value is one ASCII
/// character.
pub fn parse_delimiter(value: &str) -> Result<char, ConfigError> {
    match value {
        "\\t" | "tab" => return Ok('\t'),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(ConfigError::InvalidDelimiter(value.to_string())),
    }
}

/// SQLite URL from `BTLENS_DATABASE_URL`, defaulting to `backtests.db` in the
/// working directory.
#[must_use]
pub fn database_url_from_env() -> String {
    env::var("BTLENS_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!("mt5".parse::<IngestPreset>().unwrap(), IngestPreset::Mt5);
        assert_eq!(
            "MT5-UTF8".parse::<IngestPreset>().unwrap(),
            IngestPreset::Mt5Utf8
        );
        assert_eq!(
            "capital".parse::<IngestPreset>().unwrap(),
            IngestPreset::Capital
        );
        assert!("csv".parse::<IngestPreset>().is_err());
    }

    #[test]
    fn test_encoding_parsing() {
        assert_eq!(
            "UTF-16".parse::<SourceEncoding>().unwrap(),
            SourceEncoding::Utf16
        );
        assert_eq!(
            "iso-8859-1".parse::<SourceEncoding>().unwrap(),
            SourceEncoding::Latin1
        );
        assert!("ebcdic".parse::<SourceEncoding>().is_err());
    }

    #[test]
    fn test_delimiter_parsing() {
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("§").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn test_presets() {
        let mt5 = IngestConfig::preset(IngestPreset::Mt5);
        assert_eq!(mt5.encoding, SourceEncoding::Utf16);
        assert_eq!(mt5.delimiter_byte().unwrap(), b'\t');
        assert_eq!(mt5.columns.equity.as_deref(), Some("<EQUITY>"));

        let capital = IngestConfig::preset(IngestPreset::Capital);
        assert_eq!(capital.date_format, "%Y.%m.%d %H.%M");
        assert!(capital.columns.equity.is_none());
    }

    #[test]
    fn test_json_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingest.json");
        let config = IngestConfig::preset(IngestPreset::Capital);
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(IngestConfig::from_json_file(&path).unwrap(), config);

        assert!(matches!(
            IngestConfig::from_json_file(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
