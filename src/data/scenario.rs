//! Baseline for scenario modelling

use super::{DataLayer, keys};
use crate::cache::TtlCategory;
use crate::error::Result;
use crate::models::{BaselineMetrics, BuSummary, DashboardSummary};

/// Headcount cost as a share of revenue
const HEADCOUNT_COST_RATIO: f64 = 0.08;

fn baseline(summary: &DashboardSummary, bus: &[BuSummary]) -> BaselineMetrics {
    BaselineMetrics {
        total_revenue: summary.total_revenue,
        total_rr: summary.total_rr,
        total_nrr: summary.total_nrr,
        ebitda: summary.ebitda,
        ebitda_target: summary.ebitda_target,
        net_margin_pct: summary.net_margin_pct,
        net_margin_target: summary.net_margin_target,
        headcount: summary.headcount,
        headcount_cost: summary.total_revenue * HEADCOUNT_COST_RATIO,
        total_costs: summary.total_revenue * (1.0 - summary.net_margin_pct / 100.0),
        customer_count: bus.iter().map(|b| b.customer_count).sum(),
    }
}

impl DataLayer {
    pub async fn baseline_metrics(&self) -> Result<BaselineMetrics> {
        let this = self.clone();
        self.cache
            .get(
                keys::BASELINE,
                move || async move {
                    let (summary, bus) =
                        tokio::try_join!(this.dashboard_summary(), this.bu_summaries())?;
                    Ok(baseline(&summary, &bus))
                },
                self.options(TtlCategory::Financial),
            )
            .await
    }
}
