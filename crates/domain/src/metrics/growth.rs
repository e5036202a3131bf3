use crate::error::DomainError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Days per year used to annualise elapsed time.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Elapsed time between two timestamps, in years.
pub fn elapsed_years(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let seconds = (end - start).num_seconds() as f64;
    seconds / (DAYS_PER_YEAR * 86_400.0)
}

/// Compound annual growth rate.
/// formula: (last / first) ^ (1 / years) - 1
///
/// # Arguments
///
/// * `first` - Value at the start of the period
/// * `last` - Value at the end of the period
/// * `years` - Elapsed time in years
///
/// # Returns
///
/// * `Ok(None)` when the rate is undefined (non-positive start value, negative
///   end value, no elapsed time) or too large for a `Decimal`, as happens when
///   a gain over a few hours is annualised
/// * `Ok(Some(rate))` as a fraction, e.g. `0.21` for 21%
pub fn cagr(first: Decimal, last: Decimal, years: f64) -> Result<Option<Decimal>, DomainError> {
    if first <= Decimal::ZERO || last < Decimal::ZERO || years <= 0.0 || !years.is_finite() {
        return Ok(None);
    }

    // rust_decimal has no fractional powers without the maths feature; the
    // rate is an estimate, so f64 is precise enough.
    let ratio = (last / first)
        .to_f64()
        .ok_or(DomainError::Conversion(last / first))?;
    let rate = ratio.powf(1.0 / years) - 1.0;

    if !rate.is_finite() {
        return Ok(None);
    }
    Ok(Decimal::from_f64(rate).map(|r| r.round_dp(6)))
}
