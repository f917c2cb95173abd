//! Domain models
//!
//! Records produced by the extraction scripts and the customer store, plus
//! the derived views the data adapters compute from them. [`display`] holds
//! the table rows used for pretty output.

pub mod alert;
pub mod briefing;
pub mod customer;
pub mod display;
pub mod dm;
pub mod financial;
pub mod recommendation;

pub use alert::{Alert, Severity};
pub use briefing::Briefing;
pub use customer::{Customer, CustomerWithHealth, HealthScore, Subscription};
pub use dm::{BuDm, DM_TARGET, DmTrackerData};
pub use financial::{BaselineMetrics, BuFinancials, BuSummary, DashboardSummary, RevenueTrendPoint};
pub use recommendation::{
    BuPortfolio, ConsolidatedPortfolio, Effort, PortfolioSummary, Priority, Recommendation,
    RecommendationFilters, RecommendationStatus, RecommendationType,
};
