use crate::error::DomainError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` window over timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    ///
    /// # Errors
    /// Returns [`DomainError::InvertedRange`] when the bounds are reversed.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a range covering whole calendar days, from the first instant of
    /// `start` to the last representable instant of `end`.
    ///
    /// # Errors
    /// Returns [`DomainError::InvertedRange`] when `start` is after `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .unwrap_or(NaiveTime::MIN);
        Self::new(start.and_time(NaiveTime::MIN), end.and_time(end_of_day))
    }

    /// Whether `timestamp` falls inside the range, bounds included.
    #[must_use]
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRange::new(at(2023, 6, 1, 0, 0), at(2023, 5, 1, 0, 0)).unwrap_err();
        assert!(matches!(err, DomainError::InvertedRange { .. }));

        let start = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(DateRange::from_dates(start, end).is_err());
    }

    #[test]
    fn test_single_instant_range() {
        let t = at(2023, 3, 3, 12, 0);
        let range = DateRange::new(t, t).unwrap();
        assert!(range.contains(t));
        assert!(!range.contains(at(2023, 3, 3, 12, 1)));
    }

    #[test]
    fn test_from_dates_covers_whole_end_day() {
        let day = NaiveDate::from_ymd_opt(2023, 3, 3).unwrap();
        let range = DateRange::from_dates(day, day).unwrap();
        assert!(range.contains(at(2023, 3, 3, 0, 0)));
        assert!(range.contains(at(2023, 3, 3, 23, 59)));
        assert!(!range.contains(at(2023, 3, 4, 0, 0)));
        assert!(!range.contains(at(2023, 3, 2, 23, 59)));
    }
}
