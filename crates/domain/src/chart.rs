//! Plot-ready series derived from an account history.

use crate::entities::equity_series::EquitySeries;
use crate::error::DomainError;
use crate::metrics::drawdown::drawdown_series;
use crate::metrics::monthly::{MonthlyReturn, monthly_returns};
use crate::metrics::profit::profit_curve;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single `(x, y)` sample of a line chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: NaiveDateTime,
    pub value: Decimal,
}

/// Everything the dashboard plots for one selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartData {
    /// Balance minus the initial balance.
    pub profit: Vec<ChartPoint>,
    pub balance: Vec<ChartPoint>,
    pub equity: Vec<ChartPoint>,
    /// Running peak of balance minus balance.
    pub drawdown: Vec<ChartPoint>,
    pub monthly_returns: Vec<MonthlyReturn>,
}

impl ChartData {
    /// Builds every chart series for `series`.
    ///
    /// # Errors
    /// Propagates [`DomainError::ZeroBase`] from the monthly resampling.
    pub fn from_series(series: &EquitySeries) -> Result<Self, DomainError> {
        let timestamps: Vec<NaiveDateTime> = series.points().iter().map(|p| p.timestamp).collect();
        let zip = |values: Vec<Decimal>| -> Vec<ChartPoint> {
            timestamps
                .iter()
                .zip(values)
                .map(|(&timestamp, value)| ChartPoint { timestamp, value })
                .collect()
        };

        let balances = series.balances();
        Ok(Self {
            profit: zip(profit_curve(&balances)),
            drawdown: zip(drawdown_series(&balances)),
            balance: zip(balances),
            equity: zip(series.equities()),
            monthly_returns: monthly_returns(series)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::equity_point::EquityPoint;
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;

    #[test]
    fn test_chart_series_align_with_rows() {
        let t0 = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let series = EquitySeries::new(vec![
            EquityPoint::new(t0, dec!(100), dec!(98)),
            EquityPoint::new(t0 + Duration::hours(1), dec!(150), dec!(149)),
            EquityPoint::new(t0 + Duration::hours(2), dec!(120), dec!(125)),
        ]);
        let chart = ChartData::from_series(&series).unwrap();

        assert_eq!(chart.profit.len(), 3);
        assert_eq!(chart.profit[1].value, dec!(50));
        assert_eq!(chart.drawdown[2].value, dec!(30));
        assert_eq!(chart.drawdown[2].timestamp, t0 + Duration::hours(2));
        assert_eq!(chart.equity[0].value, dec!(98));
        assert_eq!(chart.balance[2].value, dec!(120));
        assert_eq!(chart.monthly_returns.len(), 1);
    }

    #[test]
    fn test_chart_empty_series() {
        let chart = ChartData::from_series(&EquitySeries::default()).unwrap();
        assert_eq!(chart, ChartData::default());
    }
}
