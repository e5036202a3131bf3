use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Peak-to-current drawdown summary, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawdownStats {
    /// Largest drawdown observed.
    pub max: Decimal,
    /// Mean drawdown across every observation.
    pub mean: Decimal,
}

/// Running maximum minus the current value, element by element.
///
/// # Arguments
///
/// * `values` - A time-ordered balance or equity column
///
/// # Returns
///
/// A vector of the same length; every element is `>= 0`.
pub fn drawdown_series(values: &[Decimal]) -> Vec<Decimal> {
    let mut peak: Option<Decimal> = None;
    values
        .iter()
        .map(|&value| {
            let running_max = peak.map_or(value, |p| p.max(value));
            peak = Some(running_max);
            running_max - value
        })
        .collect()
}

/// Maximum and mean of [`drawdown_series`], each rounded to 2 decimal places.
///
/// # Errors
/// Returns [`DomainError::EmptySeries`] if `values` is empty.
pub fn drawdown_stats(values: &[Decimal]) -> Result<DrawdownStats, DomainError> {
    if values.is_empty() {
        return Err(DomainError::EmptySeries);
    }

    let drawdowns = drawdown_series(values);
    let max = drawdowns.iter().copied().max().unwrap_or(Decimal::ZERO);
    let sum: Decimal = drawdowns.iter().sum();
    let mean = sum / Decimal::from(drawdowns.len());

    Ok(DrawdownStats {
        max: max.round_dp(2),
        mean: mean.round_dp(2),
    })
}

/// Lowest value minus the first value: how far the account fell below its
/// starting deposit. Zero or negative.
///
/// # Errors
/// Returns [`DomainError::EmptySeries`] if `values` is empty.
pub fn relative_drawdown(values: &[Decimal]) -> Result<Decimal, DomainError> {
    let first = values.first().ok_or(DomainError::EmptySeries)?;
    let min = values.iter().min().ok_or(DomainError::EmptySeries)?;
    Ok(*min - *first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_drawdown_series() {
        let balances = [dec!(100), dec!(150), dec!(120), dec!(180)];
        assert_eq!(
            drawdown_series(&balances),
            vec![dec!(0), dec!(0), dec!(30), dec!(0)]
        );

        let stats = drawdown_stats(&balances).unwrap();
        assert_eq!(stats.max, dec!(30));
        assert_eq!(stats.mean, dec!(7.5));
    }

    #[test]
    fn test_increasing_series_has_no_drawdown() {
        let balances = [dec!(10), dec!(11), dec!(12.5), dec!(20)];
        assert!(drawdown_series(&balances).iter().all(|d| d.is_zero()));
        let stats = drawdown_stats(&balances).unwrap();
        assert_eq!(stats.max, Decimal::ZERO);
        assert_eq!(stats.mean, Decimal::ZERO);
    }

    #[test]
    fn test_mean_is_rounded() {
        // drawdowns: 0, 1, 0 -> mean 0.333..
        let stats = drawdown_stats(&[dec!(5), dec!(4), dec!(6)]).unwrap();
        assert_eq!(stats.mean, dec!(0.33));
        assert_eq!(stats.max, dec!(1));
    }

    #[test]
    fn test_relative_drawdown() {
        let balances = [dec!(100), dec!(150), dec!(90), dec!(180)];
        assert_eq!(relative_drawdown(&balances).unwrap(), dec!(-10));
        assert_eq!(relative_drawdown(&[dec!(5), dec!(7)]).unwrap(), dec!(0));
    }

    #[test]
    fn test_empty_input() {
        assert!(drawdown_series(&[]).is_empty());
        assert_eq!(drawdown_stats(&[]), Err(DomainError::EmptySeries));
        assert_eq!(relative_drawdown(&[]), Err(DomainError::EmptySeries));
    }
}
