//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use btlens_domain::prelude::*;
//! ```

pub use crate::chart::{ChartData, ChartPoint};
pub use crate::entities::{EquityPoint, EquitySeries};
pub use crate::error::DomainError;
pub use crate::metrics::MetricsReport;
pub use crate::metrics::drawdown::DrawdownStats;
pub use crate::metrics::monthly::{MonthCounts, MonthlyReturn};
pub use crate::value_objects::DateRange;
