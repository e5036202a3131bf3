//! Domain types and arithmetic for backtest account histories.
//!
//! This crate has no I/O. It provides:
//! - The [`EquitySeries`](entities::EquitySeries) time series and its date filtering
//! - Balance and equity drawdown statistics
//! - Profit, CAGR and monthly recovery/profit factors
//! - Plot-ready chart series

/// Prelude module for convenient imports.
pub mod prelude;

/// Plot-ready series.
pub mod chart;
/// Account history types.
pub mod entities;
/// Error types.
pub mod error;
/// Metric formulas and the summary report.
pub mod metrics;
/// Value objects.
pub mod value_objects;

pub use error::DomainError;
