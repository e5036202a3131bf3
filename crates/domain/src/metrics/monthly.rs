//! Calendar-month resampling and the factors derived from monthly returns.

use crate::entities::equity_series::EquitySeries;
use crate::error::DomainError;
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Return of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    /// Last equity observed in the month.
    pub close: Decimal,
    /// `close / previous close - 1`.
    pub return_pct: Decimal,
}

/// Number of winning and losing months. Flat months count as neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCounts {
    pub positive: u32,
    pub negative: u32,
}

/// Resamples equity to month-end closes and computes each month's return.
///
/// The first month is measured against the first observation of the series,
/// so a history that starts mid-month still yields a return for that month.
///
/// # Errors
/// Returns [`DomainError::ZeroBase`] if a base close is zero.
pub fn monthly_returns(series: &EquitySeries) -> Result<Vec<MonthlyReturn>, DomainError> {
    let Some(first) = series.first() else {
        return Ok(Vec::new());
    };

    let mut closes: Vec<(i32, u32, Decimal)> = Vec::new();
    for point in series.points() {
        let key = (point.timestamp.year(), point.timestamp.month());
        match closes.last_mut() {
            Some(last) if (last.0, last.1) == key => last.2 = point.equity,
            _ => closes.push((key.0, key.1, point.equity)),
        }
    }

    let mut base = first.equity;
    let mut returns = Vec::with_capacity(closes.len());
    for (year, month, close) in closes {
        if base.is_zero() {
            return Err(DomainError::ZeroBase { year, month });
        }
        returns.push(MonthlyReturn {
            year,
            month,
            close,
            return_pct: close / base - Decimal::ONE,
        });
        base = close;
    }
    Ok(returns)
}

fn negative_sum(returns: &[Decimal]) -> Decimal {
    returns
        .iter()
        .filter(|r| r.is_sign_negative() && !r.is_zero())
        .sum::<Decimal>()
        .abs()
}

/// Sum of all returns divided by the absolute sum of negative returns.
///
/// Returns `None` when no month lost money.
pub fn recovery_factor(returns: &[Decimal]) -> Option<Decimal> {
    let losses = negative_sum(returns);
    if losses.is_zero() {
        return None;
    }
    let total: Decimal = returns.iter().sum();
    Some(total / losses)
}

/// Sum of positive returns divided by the absolute sum of negative returns.
///
/// Returns `None` when no month lost money.
pub fn profit_factor(returns: &[Decimal]) -> Option<Decimal> {
    let losses = negative_sum(returns);
    if losses.is_zero() {
        return None;
    }
    let gains: Decimal = returns.iter().filter(|r| **r > Decimal::ZERO).sum();
    Some(gains / losses)
}

pub fn month_counts(returns: &[Decimal]) -> MonthCounts {
    returns.iter().fold(MonthCounts::default(), |mut acc, r| {
        if *r > Decimal::ZERO {
            acc.positive += 1;
        } else if *r < Decimal::ZERO {
            acc.negative += 1;
        }
        acc
    })
}
