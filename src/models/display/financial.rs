//! Dashboard, trend and baseline display models

use serde::Serialize;
use tabled::Tabled;

use super::common::{format_money, format_pct, format_points};
use crate::models::{BaselineMetrics, BuSummary, DashboardSummary, RevenueTrendPoint};

/// One KPI with its target, used for single-record sections.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct MetricRow {
    #[tabled(rename = "METRIC")]
    pub metric: String,

    #[tabled(rename = "VALUE")]
    pub value: String,

    #[tabled(rename = "TARGET")]
    pub target: String,
}

impl MetricRow {
    fn new(metric: &str, value: String, target: impl Into<String>) -> Self {
        Self {
            metric: metric.to_string(),
            value,
            target: target.into(),
        }
    }
}

pub fn dashboard_rows(summary: &DashboardSummary) -> Vec<MetricRow> {
    vec![
        MetricRow::new("Total revenue", format_money(summary.total_revenue), ""),
        MetricRow::new(
            "Recurring revenue",
            format_money(summary.total_rr),
            format_money(summary.rr_target),
        ),
        MetricRow::new("Non-recurring revenue", format_money(summary.total_nrr), ""),
        MetricRow::new(
            "EBITDA",
            format_money(summary.ebitda),
            format_money(summary.ebitda_target),
        ),
        MetricRow::new(
            "Net margin",
            format_pct(summary.net_margin_pct),
            format_pct(summary.net_margin_target),
        ),
        MetricRow::new("Headcount", summary.headcount.to_string(), ""),
    ]
}

pub fn baseline_rows(base: &BaselineMetrics) -> Vec<MetricRow> {
    vec![
        MetricRow::new("Total revenue", format_money(base.total_revenue), ""),
        MetricRow::new("Recurring revenue", format_money(base.total_rr), ""),
        MetricRow::new("Non-recurring revenue", format_money(base.total_nrr), ""),
        MetricRow::new(
            "EBITDA",
            format_money(base.ebitda),
            format_money(base.ebitda_target),
        ),
        MetricRow::new(
            "Net margin",
            format_pct(base.net_margin_pct),
            format_pct(base.net_margin_target),
        ),
        MetricRow::new("Total costs", format_money(base.total_costs), ""),
        MetricRow::new("Headcount", base.headcount.to_string(), ""),
        MetricRow::new("Headcount cost", format_money(base.headcount_cost), ""),
        MetricRow::new("Customers", base.customer_count.to_string(), ""),
    ]
}

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct BuSummaryRow {
    #[tabled(rename = "BU")]
    pub bu: String,

    #[tabled(rename = "RR")]
    pub rr: String,

    #[tabled(rename = "NRR")]
    pub nrr: String,

    #[tabled(rename = "REVENUE")]
    pub revenue: String,

    #[tabled(rename = "CUSTOMERS")]
    pub customers: u32,

    #[tabled(rename = "MARGIN")]
    pub margin: String,

    #[tabled(rename = "TARGET")]
    pub target: String,

    /// Positive when above target
    #[tabled(rename = "VS TARGET")]
    pub versus: String,
}

impl From<&BuSummary> for BuSummaryRow {
    fn from(bu: &BuSummary) -> Self {
        Self {
            bu: bu.bu.clone(),
            rr: format_money(bu.total_rr),
            nrr: format_money(bu.total_nrr),
            revenue: format_money(bu.total_revenue),
            customers: bu.customer_count,
            margin: format_pct(bu.net_margin_pct),
            target: format_pct(bu.net_margin_target),
            versus: format_points(-bu.margin_gap()),
        }
    }
}

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct TrendRow {
    #[tabled(rename = "QUARTER")]
    pub quarter: String,

    #[tabled(rename = "REVENUE")]
    pub revenue: String,

    #[tabled(rename = "TARGET")]
    pub target: String,
}

impl From<&RevenueTrendPoint> for TrendRow {
    fn from(point: &RevenueTrendPoint) -> Self {
        Self {
            quarter: point.quarter.clone(),
            revenue: format_money(point.revenue),
            target: format_money(point.target),
        }
    }
}
