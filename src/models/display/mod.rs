//! Display model implementations for table output
//!
//! Display models turn domain records into rows with formatted money and
//! percentages. JSON output serializes the domain records directly.

pub mod common;
mod customer;
mod dm;
mod financial;
mod recommendation;

pub use customer::{AlertRow, CustomerRow};
pub use dm::{DmRow, ForecastRow};
pub use financial::{BuSummaryRow, TrendRow, baseline_rows, dashboard_rows};
pub use recommendation::{PortfolioRow, RecommendationRow};
