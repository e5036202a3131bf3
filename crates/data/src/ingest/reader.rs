use super::{IngestError, decode};
use crate::config::{
    CANONICAL_BALANCE, CANONICAL_DATE, CANONICAL_EQUITY, ColumnMapping, IngestConfig,
    NORMALIZED_DATE_FORMAT,
};
use btlens_domain::entities::{EquityPoint, EquitySeries};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, info};

/// Renames source headers to canonical names.
///
/// Headers that already carry a canonical name are kept, so applying the
/// rename twice gives the same result. Unmapped headers pass through trimmed.
pub fn rename_headers<'a, I>(headers: I, mapping: &ColumnMapping) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    headers
        .into_iter()
        .map(|raw| {
            let header = raw.trim().trim_start_matches('\u{feff}');
            if header == mapping.date {
                CANONICAL_DATE.to_string()
            } else if header == mapping.balance {
                CANONICAL_BALANCE.to_string()
            } else if mapping.equity.as_deref() == Some(header) {
                CANONICAL_EQUITY.to_string()
            } else {
                header.to_string()
            }
        })
        .collect()
}

/// Positions of the canonical columns within a record.
struct ColumnIndex {
    date: usize,
    balance: usize,
    equity: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, mapping: &ColumnMapping) -> Result<Self, IngestError> {
        let renamed = rename_headers(headers.iter(), mapping);
        let position = |canonical: &str| renamed.iter().position(|h| h == canonical);
        let missing = |column: &'static str, expected: &str| IngestError::MissingColumn {
            column,
            expected: expected.to_string(),
            found: headers.iter().map(str::to_string).collect(),
        };

        let date = position(CANONICAL_DATE).ok_or_else(|| missing(CANONICAL_DATE, &mapping.date))?;
        let balance = position(CANONICAL_BALANCE)
            .ok_or_else(|| missing(CANONICAL_BALANCE, &mapping.balance))?;
        let equity = match &mapping.equity {
            Some(expected) => Some(
                position(CANONICAL_EQUITY).ok_or_else(|| missing(CANONICAL_EQUITY, expected))?,
            ),
            None => position(CANONICAL_EQUITY),
        };

        Ok(Self {
            date,
            balance,
            equity,
        })
    }
}

/// Turns CSV uploads into equity series according to an [`IngestConfig`].
#[derive(Debug, Clone)]
pub struct CsvIngestor {
    config: IngestConfig,
}

impl CsvIngestor {
    /// Creates an ingestor.
    #[must_use]
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Decodes and ingests raw upload bytes.
    ///
    /// # Errors
    /// Returns an error if decoding, parsing or column resolution fails.
    pub fn ingest_bytes(&self, bytes: &[u8]) -> Result<EquitySeries, IngestError> {
        let text = decode(bytes, self.config.encoding)?;
        self.ingest_str(&text)
    }

    /// Ingests already-decoded CSV text.
    ///
    /// # Errors
    /// Returns an error if parsing or column resolution fails, or if the file
    /// holds no rows.
    pub fn ingest_str(&self, text: &str) -> Result<EquitySeries, IngestError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter_byte()?)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::resolve(&headers, &self.config.columns)?;
        debug!(headers = ?headers, "Resolved CSV columns");

        let mut points = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let row = index + 1;

            let timestamp = self.parse_timestamp(record.get(columns.date).unwrap_or(""), row)?;
            let balance = parse_decimal(record.get(columns.balance), row, CANONICAL_BALANCE)?;
            let equity = match columns.equity {
                Some(i) => parse_decimal(record.get(i), row, CANONICAL_EQUITY)?,
                None => balance,
            };
            points.push(EquityPoint::new(timestamp, balance, equity));
        }

        if points.is_empty() {
            return Err(IngestError::Empty);
        }
        info!(rows = points.len(), "CSV ingested");
        Ok(EquitySeries::new(points))
    }

    /// Parses a date cell with the configured format, and only that format.
    /// A date-only format yields midnight.
    fn parse_timestamp(&self, value: &str, row: usize) -> Result<NaiveDateTime, IngestError> {
        parse_with_format(value, &self.config.date_format).ok_or_else(|| IngestError::DateParse {
            row,
            value: value.to_string(),
            format: self.config.date_format.clone(),
        })
    }

    /// Writes `series` as normalised CSV: `DATE,BALANCE,EQUITY`, comma
    /// separated, dates in the [`IngestConfig::normalized`] format.
    ///
    /// # Errors
    /// Returns [`IngestError::Export`] if the writer fails.
    pub fn to_csv(series: &EquitySeries) -> Result<String, IngestError> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record([CANONICAL_DATE, CANONICAL_BALANCE, CANONICAL_EQUITY])?;
        for point in series.points() {
            writer.write_record([
                point.timestamp.format(NORMALIZED_DATE_FORMAT).to_string(),
                point.balance.to_string(),
                point.equity.to_string(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| IngestError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| IngestError::Export(e.to_string()))
    }
}

fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn parse_decimal(
    value: Option<&str>,
    row: usize,
    column: &'static str,
) -> Result<Decimal, IngestError> {
    let value = value.unwrap_or("");
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| IngestError::NumberParse {
            row,
            column,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IngestPreset, SourceEncoding};
    use rust_decimal_macros::dec;

    const MT5_EXPORT: &str = "<DATE>\t<BALANCE>\t<EQUITY>\t<DEPOSIT LOAD>\n\
        2023.01.02 10:00\t10000.00\t10000.00\t0.0000\n\
        2023.01.02 14:30\t10150.50\t10098.20\t3.1000\n\
        2023.01.03 09:15\t9980.00\t9975.40\t0.0000\n";

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut out = vec![0xFF, 0xFE];
        out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        out
    }

    #[test]
    fn test_ingest_mt5_utf16() {
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Mt5));
        let series = ingestor
            .ingest_bytes(&utf16le_with_bom(MT5_EXPORT))
            .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.balances(), vec![dec!(10000), dec!(10150.5), dec!(9980)]);
        assert_eq!(series.last().unwrap().equity, dec!(9975.4));
        assert_eq!(
            series.start().unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_ingest_capital_report() {
        let text = "Date,Capital,Drawdown\n2023.05.01 08.00,5000,0\n2023.05.01 16.45,5100,0\n";
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Capital));
        let series = ingestor.ingest_bytes(text.as_bytes()).unwrap();

        assert_eq!(series.len(), 2);
        // no equity column: equity mirrors balance
        assert_eq!(series.equities(), series.balances());
        assert_eq!(
            series.end().unwrap(),
            NaiveDate::from_ymd_opt(2023, 5, 1)
                .unwrap()
                .and_hms_opt(16, 45, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_rename_is_idempotent() {
        let mapping = ColumnMapping::bracketed();
        let once = rename_headers(["<DATE>", " <BALANCE> ", "<EQUITY>", "<DEPOSIT LOAD>"], &mapping);
        assert_eq!(once, vec!["DATE", "BALANCE", "EQUITY", "<DEPOSIT LOAD>"]);

        let twice = rename_headers(once.iter().map(String::as_str), &mapping);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_already_normalized_headers_ingest() {
        let text = "DATE\tBALANCE\tEQUITY\n2023.01.02 10:00\t100\t99\n";
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Mt5Utf8));
        let series = ingestor.ingest_str(text).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.first().unwrap().equity, dec!(99));
    }

    #[test]
    fn test_normalized_export_reingests_identically() {
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Mt5Utf8));
        let series = ingestor.ingest_str(MT5_EXPORT).unwrap();

        let exported = CsvIngestor::to_csv(&series).unwrap();
        assert!(exported.starts_with("DATE,BALANCE,EQUITY\n"));

        let normalized = CsvIngestor::new(IngestConfig::normalized());
        let again = normalized.ingest_str(&exported).unwrap();
        assert_eq!(again, series);

        // and once more, through its own export
        let exported_again = CsvIngestor::to_csv(&again).unwrap();
        assert_eq!(exported_again, exported);
    }

    #[test]
    fn test_only_configured_date_format_is_accepted() {
        let text = "DATE\tBALANCE\tEQUITY\n2023-01-02 10:00:00\t100\t100\n";
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Mt5Utf8));
        assert!(matches!(
            ingestor.ingest_str(text),
            Err(IngestError::DateParse { row: 1, .. })
        ));
    }

    #[test]
    fn test_date_only_format_yields_midnight() {
        let config = IngestConfig {
            date_format: "%Y-%m-%d".to_string(),
            ..IngestConfig::normalized()
        };
        let series = CsvIngestor::new(config)
            .ingest_str("DATE,BALANCE,EQUITY\n2023-01-02,100,100\n")
            .unwrap();
        assert_eq!(
            series.start(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn test_date_parse_failure() {
        let text = "<DATE>\t<BALANCE>\t<EQUITY>\n2023.01.02 10:00\t100\t100\n31/01/2023\t101\t101\n";
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Mt5Utf8));
        match ingestor.ingest_str(text) {
            Err(IngestError::DateParse { row, value, format }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "31/01/2023");
                assert_eq!(format, "%Y.%m.%d %H:%M");
            }
            other => panic!("expected DateParse, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_column() {
        let text = "<DATE>\t<EQUITY>\n2023.01.02 10:00\t100\n";
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Mt5Utf8));
        assert!(matches!(
            ingestor.ingest_str(text),
            Err(IngestError::MissingColumn {
                column: CANONICAL_BALANCE,
                ..
            })
        ));
    }

    #[test]
    fn test_number_parse_failure() {
        let text = "<DATE>\t<BALANCE>\t<EQUITY>\n2023.01.02 10:00\tn/a\t100\n";
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Mt5Utf8));
        assert!(matches!(
            ingestor.ingest_str(text),
            Err(IngestError::NumberParse { row: 1, column: CANONICAL_BALANCE, .. })
        ));
    }

    #[test]
    fn test_header_only_file() {
        let ingestor = CsvIngestor::new(IngestConfig::preset(IngestPreset::Mt5Utf8));
        assert!(matches!(
            ingestor.ingest_str("<DATE>\t<BALANCE>\t<EQUITY>\n"),
            Err(IngestError::Empty)
        ));
    }

    #[test]
    fn test_utf16_file_read_as_utf8_fails_to_resolve() {
        let mut config = IngestConfig::preset(IngestPreset::Mt5);
        config.encoding = SourceEncoding::Utf8;
        let ingestor = CsvIngestor::new(config);
        assert!(ingestor.ingest_bytes(&utf16le_with_bom(MT5_EXPORT)).is_err());
    }
}
