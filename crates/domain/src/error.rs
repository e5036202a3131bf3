//! Errors raised by domain arithmetic and value objects.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Errors produced while building domain values or computing metrics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// The series (or the filtered selection) contains no rows.
    #[error("series is empty")]
    EmptySeries,
    /// A date range whose start lies after its end.
    #[error("start ({start}) must be less than or equal to end ({end})")]
    InvertedRange {
        /// Requested start.
        start: NaiveDateTime,
        /// Requested end.
        end: NaiveDateTime,
    },
    /// A monthly return would divide by a zero close.
    #[error("cannot compute a return from a zero base value in {year}-{month:02}")]
    ZeroBase {
        /// Calendar year of the month whose base was zero.
        year: i32,
        /// Calendar month (1-12).
        month: u32,
    },
    /// A value could not be represented during a numeric conversion.
    #[error("numeric conversion failed for {0}")]
    Conversion(Decimal),
}
