use crate::error::DomainError;
use rust_decimal::Decimal;

/// Initial deposit: the first balance.
///
/// # Errors
/// Returns [`DomainError::EmptySeries`] if `balances` is empty.
pub fn deposit(balances: &[Decimal]) -> Result<Decimal, DomainError> {
    balances.first().copied().ok_or(DomainError::EmptySeries)
}

/// Last balance minus first balance.
///
/// # Errors
/// Returns [`DomainError::EmptySeries`] if `balances` is empty.
pub fn gross_profit(balances: &[Decimal]) -> Result<Decimal, DomainError> {
    match (balances.first(), balances.last()) {
        (Some(first), Some(last)) => Ok(*last - *first),
        _ => Err(DomainError::EmptySeries),
    }
}

/// Highest balance reached minus first balance.
///
/// # Errors
/// Returns [`DomainError::EmptySeries`] if `balances` is empty.
pub fn max_profit(balances: &[Decimal]) -> Result<Decimal, DomainError> {
    let first = balances.first().ok_or(DomainError::EmptySeries)?;
    let max = balances.iter().max().ok_or(DomainError::EmptySeries)?;
    Ok(*max - *first)
}

/// Balance relative to the first observation, the dashboards' profit curve.
pub fn profit_curve(balances: &[Decimal]) -> Vec<Decimal> {
    match balances.first() {
        Some(&first) => balances.iter().map(|b| *b - first).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profit_figures() {
        let balances = [dec!(100), dec!(150), dec!(120), dec!(180)];
        assert_eq!(deposit(&balances).unwrap(), dec!(100));
        assert_eq!(gross_profit(&balances).unwrap(), dec!(80));
        assert_eq!(max_profit(&balances).unwrap(), dec!(80));
        assert_eq!(
            profit_curve(&balances),
            vec![dec!(0), dec!(50), dec!(20), dec!(80)]
        );
    }

    #[test]
    fn test_losing_history() {
        let balances = [dec!(1000), dec!(1200), dec!(700)];
        assert_eq!(gross_profit(&balances).unwrap(), dec!(-300));
        assert_eq!(max_profit(&balances).unwrap(), dec!(200));
    }

    #[test]
    fn test_empty_balances() {
        assert_eq!(deposit(&[]), Err(DomainError::EmptySeries));
        assert_eq!(gross_profit(&[]), Err(DomainError::EmptySeries));
        assert_eq!(max_profit(&[]), Err(DomainError::EmptySeries));
        assert!(profit_curve(&[]).is_empty());
    }
}
