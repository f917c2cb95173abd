//! Retention strategy recommendations and the portfolio roll-up

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Retention,
    Expansion,
    Pricing,
    Product,
    Engagement,
    Health,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Retention => "retention",
            RecommendationType::Expansion => "expansion",
            RecommendationType::Pricing => "pricing",
            RecommendationType::Product => "product",
            RecommendationType::Engagement => "engagement",
            RecommendationType::Health => "health",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Pending,
    InProgress,
    Completed,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Low => "low",
            Effort::Medium => "medium",
            Effort::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: String,
    pub bu: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub status: RecommendationStatus,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub suggested_action: String,
    pub estimated_arr_impact: f64,
    /// Percentage points
    pub estimated_dm_impact: f64,
    pub estimated_effort: Effort,
    pub timeframe: String,
    pub created_at: DateTime<Utc>,
}

/// Filters for the recommendation list; also the cache key parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendationFilters {
    pub bu: Option<String>,
    pub priority: Option<Priority>,
    #[serde(rename = "type")]
    pub kind: Option<RecommendationType>,
    pub status: Option<RecommendationStatus>,
    pub account_name: Option<String>,
}

impl RecommendationFilters {
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn matches(&self, rec: &Recommendation) -> bool {
        self.bu.as_ref().is_none_or(|bu| *bu == rec.bu)
            && self.priority.is_none_or(|p| p == rec.priority)
            && self.kind.is_none_or(|k| k == rec.kind)
            && self.status.is_none_or(|s| s == rec.status)
            && self
                .account_name
                .as_ref()
                .is_none_or(|name| rec.account_name.as_ref() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuPortfolio {
    pub bu: String,
    pub current_dm: f64,
    pub target_dm: f64,
    pub dm_gap: f64,
    pub current_arr: f64,
    pub at_risk_arr: f64,
    pub recommendation_count: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub total_estimated_impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedPortfolio {
    pub total_arr: f64,
    pub weighted_dm: f64,
    pub target_dm: f64,
    pub total_at_risk_arr: f64,
    pub total_recommendations: usize,
    pub critical_recommendations: usize,
    pub high_recommendations: usize,
    pub total_estimated_impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub business_units: Vec<BuPortfolio>,
    pub consolidated: ConsolidatedPortfolio,
}
