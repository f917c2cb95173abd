//! Financial summaries and dashboard aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-BU figures as emitted by the financials extraction script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuFinancials {
    pub bu: String,
    #[serde(rename = "totalRR")]
    pub total_rr: f64,
    #[serde(rename = "totalNRR")]
    pub total_nrr: f64,
    pub total_revenue: f64,
    #[serde(default)]
    pub cogs: f64,
    #[serde(default)]
    pub headcount_cost: f64,
    #[serde(default)]
    pub vendor_cost: f64,
    #[serde(default)]
    pub core_allocation: f64,
    pub ebitda: f64,
    /// Percent, may be negative for loss-making units
    pub net_margin: f64,
    #[serde(default)]
    pub customer_count: u32,
}

impl BuFinancials {
    /// Reject rows the aggregates cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.bu.trim().is_empty() {
            return Err(Error::Validation("financial row has an empty BU name".to_string()));
        }

        let figures = [
            ("totalRR", self.total_rr),
            ("totalNRR", self.total_nrr),
            ("totalRevenue", self.total_revenue),
            ("ebitda", self.ebitda),
            ("netMargin", self.net_margin),
        ];
        for (name, value) in figures {
            if !value.is_finite() {
                return Err(Error::Validation(format!(
                    "{}: {} is not a number",
                    self.bu, name
                )));
            }
        }

        for (name, value) in &figures[..3] {
            if *value < 0.0 {
                return Err(Error::Validation(format!(
                    "{}: {} is negative ({})",
                    self.bu, name, value
                )));
            }
        }

        Ok(())
    }
}

/// Consolidated KPIs for the dashboard overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub total_rr: f64,
    /// Prior-period comparison point
    pub rr_target: f64,
    pub total_nrr: f64,
    pub ebitda: f64,
    pub ebitda_target: f64,
    pub net_margin_pct: f64,
    pub net_margin_target: f64,
    pub headcount: u32,
    pub last_updated: DateTime<Utc>,
}

/// Dashboard row for one business unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuSummary {
    pub bu: String,
    pub total_rr: f64,
    pub total_nrr: f64,
    pub total_revenue: f64,
    pub customer_count: u32,
    pub net_margin_pct: f64,
    pub net_margin_target: f64,
    pub ebitda: f64,
}

impl BuSummary {
    /// Percentage points below target (negative when above)
    pub fn margin_gap(&self) -> f64 {
        self.net_margin_target - self.net_margin_pct
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTrendPoint {
    pub quarter: String,
    pub revenue: f64,
    pub target: f64,
}

/// Starting point for what-if scenario modelling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineMetrics {
    pub total_revenue: f64,
    pub total_rr: f64,
    pub total_nrr: f64,
    pub ebitda: f64,
    pub ebitda_target: f64,
    pub net_margin_pct: f64,
    pub net_margin_target: f64,
    pub headcount: u32,
    pub headcount_cost: f64,
    pub total_costs: f64,
    pub customer_count: u32,
}
