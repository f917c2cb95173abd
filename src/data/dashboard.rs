//! Dashboard overview, per-BU summaries and revenue trend

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{DataLayer, keys};
use crate::cache::TtlCategory;
use crate::error::{Error, Result, guard};
use crate::models::{BuFinancials, BuSummary, DashboardSummary, RevenueTrendPoint};
use crate::sources::script::{self, FINANCIALS_SCRIPT};

/// Portfolio net margin target in percent
pub const NET_MARGIN_TARGET: f64 = 68.7;

/// Full-time employees across the portfolio
pub const HEADCOUNT: u32 = 58;

/// Prior-period recurring revenue, as a share of current
const RR_TARGET_RATIO: f64 = 0.95;

const TREND_QUARTERS: [&str; 4] = ["Q2'25", "Q3'25", "Q4'25", "Q1'26"];
const QUARTERLY_GROWTH: f64 = 1.03;
const TREND_TARGET_UPLIFT: f64 = 1.05;

/// Net margin target for a business unit, in percent.
pub fn net_margin_target(bu: &str) -> f64 {
    match bu {
        "Cloudsense" => 63.6,
        "Kandy" | "STL" => 75.0,
        _ => 70.0,
    }
}

#[derive(Deserialize)]
struct FinancialsOutput {
    financials: BTreeMap<String, BuFinancials>,
}

/// Validated rows in BU name order.
fn parse_financials(raw: serde_json::Value) -> Result<Vec<BuFinancials>> {
    let output: FinancialsOutput = serde_json::from_value(raw)
        .map_err(|e| Error::Validation(format!("unexpected financials shape: {}", e)))?;

    if output.financials.is_empty() {
        return Err(Error::Validation(
            "financials extraction returned no business units".to_string(),
        ));
    }

    let rows: Vec<BuFinancials> = output.financials.into_values().collect();
    for row in &rows {
        row.validate()?;
    }
    Ok(rows)
}

fn summarize(rows: &[BuFinancials], now: DateTime<Utc>) -> DashboardSummary {
    let total_revenue: f64 = rows.iter().map(|r| r.total_revenue).sum();
    let total_rr: f64 = rows.iter().map(|r| r.total_rr).sum();
    let total_nrr: f64 = rows.iter().map(|r| r.total_nrr).sum();
    let ebitda: f64 = rows.iter().map(|r| r.ebitda).sum();

    let net_margin_pct = if total_revenue > 0.0 {
        ebitda / total_revenue * 100.0
    } else {
        0.0
    };

    DashboardSummary {
        total_revenue,
        total_rr,
        rr_target: total_rr * RR_TARGET_RATIO,
        total_nrr,
        ebitda,
        ebitda_target: total_revenue * NET_MARGIN_TARGET / 100.0,
        net_margin_pct,
        net_margin_target: NET_MARGIN_TARGET,
        headcount: HEADCOUNT,
        last_updated: now,
    }
}

fn to_summary(row: &BuFinancials) -> BuSummary {
    BuSummary {
        bu: row.bu.clone(),
        total_rr: row.total_rr,
        total_nrr: row.total_nrr,
        total_revenue: row.total_revenue,
        customer_count: row.customer_count,
        net_margin_pct: row.net_margin,
        net_margin_target: net_margin_target(&row.bu),
        ebitda: row.ebitda,
    }
}

/// Four quarters ending with the current one, growing into today's revenue.
fn trend(total_revenue: f64) -> Vec<RevenueTrendPoint> {
    let last = TREND_QUARTERS.len() - 1;
    TREND_QUARTERS
        .iter()
        .enumerate()
        .map(|(i, quarter)| {
            let revenue = total_revenue / QUARTERLY_GROWTH.powi((last - i) as i32);
            RevenueTrendPoint {
                quarter: quarter.to_string(),
                revenue: revenue.round(),
                target: (revenue * TREND_TARGET_UPLIFT).round(),
            }
        })
        .collect()
}

impl DataLayer {
    /// Per-BU financial rows from the spreadsheet.
    pub async fn financials(&self) -> Result<Vec<BuFinancials>> {
        let scripts = Arc::clone(&self.sources.scripts);
        self.cache
            .get(
                keys::FINANCIALS,
                move || {
                    guard(script::ADAPTER, async move {
                        let raw = scripts
                            .extract(FINANCIALS_SCRIPT, &["--type", "financials"])
                            .await?;
                        parse_financials(raw)
                    })
                },
                self.options(TtlCategory::Financial),
            )
            .await
    }

    /// Consolidated KPIs across every business unit.
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        let this = self.clone();
        self.cache
            .get(
                keys::DASHBOARD_OVERVIEW,
                move || async move {
                    let rows = this.financials().await?;
                    Ok(summarize(&rows, Utc::now()))
                },
                self.options(TtlCategory::Financial),
            )
            .await
    }

    pub async fn bu_summaries(&self) -> Result<Vec<BuSummary>> {
        let this = self.clone();
        self.cache
            .get(
                keys::BU_SUMMARIES,
                move || async move {
                    let rows = this.financials().await?;
                    Ok(rows.iter().map(to_summary).collect::<Vec<_>>())
                },
                self.options(TtlCategory::Financial),
            )
            .await
    }

    pub async fn revenue_trend(&self) -> Result<Vec<RevenueTrendPoint>> {
        let this = self.clone();
        self.cache
            .get(
                keys::REVENUE_TREND,
                move || async move {
                    let summary = this.dashboard_summary().await?;
                    Ok(trend(summary.total_revenue))
                },
                self.options(TtlCategory::Financial),
            )
            .await
    }
}
