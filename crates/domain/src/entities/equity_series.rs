//! Time-ordered account history.

use crate::entities::equity_point::EquityPoint;
use crate::error::DomainError;
use crate::value_objects::date_range::DateRange;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A balance/equity history ordered by non-decreasing timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquitySeries {
    points: Vec<EquityPoint>,
}

impl EquitySeries {
    /// Builds a series, stable-sorting the points by timestamp.
    ///
    /// Rows sharing a timestamp keep their input order.
    #[must_use]
    pub fn new(mut points: Vec<EquityPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&EquityPoint> {
        self.points.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }

    /// Timestamp of the first row.
    #[must_use]
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.first().map(|p| p.timestamp)
    }

    /// Timestamp of the last row.
    #[must_use]
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.last().map(|p| p.timestamp)
    }

    /// The balance column.
    #[must_use]
    pub fn balances(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.balance).collect()
    }

    /// The equity column.
    #[must_use]
    pub fn equities(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.equity).collect()
    }

    /// Whole-day range from `start` to `end`; a missing bound defaults to the
    /// first or last day of the series (the full history).
    ///
    /// # Errors
    /// Returns [`DomainError::EmptySeries`] if a bound is missing and the series
    /// is empty, or [`DomainError::InvertedRange`] if `start > end`.
    pub fn day_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DateRange, DomainError> {
        let start = match start {
            Some(day) => day,
            None => self.start().ok_or(DomainError::EmptySeries)?.date(),
        };
        let end = match end {
            Some(day) => day,
            None => self.end().ok_or(DomainError::EmptySeries)?.date(),
        };
        DateRange::from_dates(start, end)
    }

    /// Returns the rows whose timestamp lies inside `range`, bounds included.
    #[must_use]
    pub fn filter(&self, range: &DateRange) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| range.contains(p.timestamp))
                .copied()
                .collect(),
        }
    }
}

impl FromIterator<EquityPoint> for EquitySeries {
    fn from_iter<I: IntoIterator<Item = EquityPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
