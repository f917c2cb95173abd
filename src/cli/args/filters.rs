//! Filter argument types for CLI commands

use clap::Args;

use crate::models::{Priority, RecommendationFilters, RecommendationStatus, RecommendationType};
use crate::sources::CustomerFilter;

/// Filter arguments for the recommendations command.
#[derive(Args, Debug, Default, Clone)]
pub struct RecommendationFilterArgs {
    /// Only this priority (critical, high, medium, low)
    #[arg(long, short = 'p', value_enum)]
    pub priority: Option<Priority>,

    /// Only this business unit
    #[arg(long)]
    pub bu: Option<String>,

    /// Only this recommendation type
    #[arg(long = "type", short = 't', value_enum)]
    pub kind: Option<RecommendationType>,

    /// Only this status
    #[arg(long, value_enum)]
    pub status: Option<RecommendationStatus>,

    /// Maximum results to return
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

impl RecommendationFilterArgs {
    /// Adapter filters; `limit` is applied after the fetch.
    pub fn to_filters(&self) -> RecommendationFilters {
        RecommendationFilters {
            bu: self.bu.clone(),
            priority: self.priority,
            kind: self.kind,
            status: self.status,
            account_name: None,
        }
    }
}

/// Filter arguments for the customers command.
#[derive(Args, Debug, Default, Clone)]
pub struct CustomerFilterArgs {
    /// Only this business unit
    #[arg(long)]
    pub bu: Option<String>,

    /// Minimum total revenue
    #[arg(long)]
    pub min_total: Option<f64>,
}

impl From<&CustomerFilterArgs> for CustomerFilter {
    fn from(args: &CustomerFilterArgs) -> Self {
        CustomerFilter {
            bu: args.bu.clone(),
            min_total: args.min_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_args_to_filters() {
        let args = RecommendationFilterArgs {
            priority: Some(Priority::Critical),
            bu: Some("STL".to_string()),
            limit: Some(3),
            ..Default::default()
        };

        let filters = args.to_filters();
        assert_eq!(filters.priority, Some(Priority::Critical));
        assert_eq!(filters.bu.as_deref(), Some("STL"));
        assert!(filters.kind.is_none());
        assert!(filters.account_name.is_none());
    }

    #[test]
    fn test_customer_args_into_filter() {
        let args = CustomerFilterArgs {
            bu: None,
            min_total: Some(250_000.0),
        };
        let filter = CustomerFilter::from(&args);
        assert_eq!(filter.min_total, Some(250_000.0));
        assert!(filter.bu.is_none());
    }
}
