use crate::entities::equity_series::EquitySeries;
use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod drawdown;
pub mod growth;
pub mod monthly;
pub mod profit;

use drawdown::DrawdownStats;
use monthly::MonthCounts;

/// Summary metrics of one account history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub deposit: Decimal,
    pub gross_profit: Decimal,
    pub max_profit: Decimal,
    pub relative_drawdown: Decimal,
    pub balance_drawdown: DrawdownStats,
    pub equity_drawdown: DrawdownStats,
    /// Annual growth of equity as a fraction; `None` when undefined.
    pub cagr: Option<Decimal>,
    /// `None` when there was no losing month.
    pub recovery_factor: Option<Decimal>,
    /// `None` when there was no losing month.
    pub profit_factor: Option<Decimal>,
    pub months: MonthCounts,
}

impl MetricsReport {
    /// Computes every metric over `series`.
    ///
    /// # Errors
    /// Returns [`DomainError::EmptySeries`] for an empty series and
    /// [`DomainError::ZeroBase`] if monthly returns cannot be formed.
    pub fn compute(series: &EquitySeries) -> Result<Self, DomainError> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Err(DomainError::EmptySeries);
        };

        let balances = series.balances();
        let equities = series.equities();

        let years = growth::elapsed_years(first.timestamp, last.timestamp);
        let returns: Vec<Decimal> = monthly::monthly_returns(series)?
            .iter()
            .map(|m| m.return_pct)
            .collect();

        Ok(Self {
            deposit: profit::deposit(&balances)?,
            gross_profit: profit::gross_profit(&balances)?,
            max_profit: profit::max_profit(&balances)?,
            relative_drawdown: drawdown::relative_drawdown(&balances)?,
            balance_drawdown: drawdown::drawdown_stats(&balances)?,
            equity_drawdown: drawdown::drawdown_stats(&equities)?,
            cagr: growth::cagr(first.equity, last.equity, years)?.map(|r| r.round_dp(4)),
            recovery_factor: monthly::recovery_factor(&returns).map(|r| r.round_dp(2)),
            profit_factor: monthly::profit_factor(&returns).map(|r| r.round_dp(2)),
            months: monthly::month_counts(&returns),
        })
    }

    /// The report as an ordered list of `(metric name, value)` pairs.
    ///
    /// Undefined values are rendered as `"n/a"` (CAGR) or `"no drawdown"`
    /// (factors without a losing month).
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let factor = |value: Option<Decimal>| {
            value.map_or_else(|| "no drawdown".to_string(), |v| v.to_string())
        };
        vec![
            ("deposit", self.deposit.to_string()),
            ("gross_profit", self.gross_profit.to_string()),
            ("max_profit", self.max_profit.to_string()),
            ("relative_drawdown", self.relative_drawdown.to_string()),
            ("max_drawdown", self.balance_drawdown.max.to_string()),
            ("mean_drawdown", self.balance_drawdown.mean.to_string()),
            ("max_equity_drawdown", self.equity_drawdown.max.to_string()),
            ("mean_equity_drawdown", self.equity_drawdown.mean.to_string()),
            (
                "cagr",
                self.cagr
                    .map_or_else(|| "n/a".to_string(), |c| c.to_string()),
            ),
            ("recovery_factor", factor(self.recovery_factor)),
            ("profit_factor", factor(self.profit_factor)),
            ("positive_months", self.months.positive.to_string()),
            ("negative_months", self.months.negative.to_string()),
        ]
    }
}
