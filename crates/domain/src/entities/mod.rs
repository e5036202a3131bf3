pub mod equity_point;
pub mod equity_series;

// Re-export for easier access
pub use equity_point::EquityPoint;
pub use equity_series::EquitySeries;
