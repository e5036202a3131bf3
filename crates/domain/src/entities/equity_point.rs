use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of an account history export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    /// Closed-trade cash value.
    pub balance: Decimal,
    /// Balance plus the valuation of open positions.
    pub equity: Decimal,
}

impl EquityPoint {
    pub fn new(timestamp: NaiveDateTime, balance: Decimal, equity: Decimal) -> Self {
        Self {
            timestamp,
            balance,
            equity,
        }
    }
}
