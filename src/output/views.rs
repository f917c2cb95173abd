//! [`Formattable`] for every section value

use colored::Colorize;

use super::Formattable;
use super::table::{format_table, table_of};
use crate::cache::CacheStats;
use crate::models::display::common::{format_money, format_pct, truncate_string};
use crate::models::display::{
    AlertRow, BuSummaryRow, CustomerRow, DmRow, ForecastRow, PortfolioRow, RecommendationRow,
    TrendRow, baseline_rows, dashboard_rows,
};
use crate::models::{
    Alert, BaselineMetrics, Briefing, BuSummary, CustomerWithHealth, DashboardSummary,
    DmTrackerData, HealthScore, PortfolioSummary, Priority, Recommendation, RevenueTrendPoint,
    Severity,
};

impl Formattable for DashboardSummary {
    fn pretty(&self) -> String {
        let gap = self.net_margin_target - self.net_margin_pct;
        let status = if gap <= 0.0 {
            format!("{} Net margin on target", "✓".green())
        } else {
            format!(
                "{} Net margin {:.1} pts below target",
                "⚠".yellow(),
                gap
            )
        };
        format!(
            "{}\n{}\n{}",
            self.table(),
            status,
            format!("Updated {}", self.last_updated.format("%Y-%m-%d %H:%M UTC")).dimmed()
        )
    }

    fn table(&self) -> String {
        format_table(&dashboard_rows(self), "")
    }
}

impl Formattable for Vec<BuSummary> {
    fn pretty(&self) -> String {
        let mut out = self.table();
        for bu in self.iter().filter(|b| b.margin_gap() > 0.0) {
            out.push_str(&format!(
                "\n{} {} margin {} vs target {}",
                "⚠".yellow(),
                bu.bu.bold(),
                format_pct(bu.net_margin_pct),
                format_pct(bu.net_margin_target)
            ));
        }
        out
    }

    fn table(&self) -> String {
        table_of::<_, BuSummaryRow>(self, "No business units.")
    }
}

impl Formattable for Vec<RevenueTrendPoint> {
    fn pretty(&self) -> String {
        table_of::<_, TrendRow>(self, "No trend data.")
    }
}

impl Formattable for DmTrackerData {
    fn pretty(&self) -> String {
        let c = &self.consolidated;
        let headline = format!(
            "Consolidated DM% {} (target {}) for {}",
            format_pct(c.dm_pct),
            format_pct(c.target),
            self.fiscal_quarter
        );
        let headline = if c.meets_target {
            format!("{} {}", "✓".green(), headline)
        } else {
            format!("{} {}", "✗".red(), headline)
        };
        format!("{}\n{}", headline.bold(), self.table())
    }

    fn table(&self) -> String {
        let mut out = table_of::<_, DmRow>(&self.business_units, "No business units.");
        if !self.forecast.quarters.is_empty() {
            out.push_str(&format!("\nForecast ({}):\n", self.forecast.method));
            out.push_str(&table_of::<_, ForecastRow>(&self.forecast.quarters, ""));
        }
        out
    }
}

impl Formattable for Vec<CustomerWithHealth> {
    fn pretty(&self) -> String {
        let count = |score: HealthScore| self.iter().filter(|c| c.health_score == score).count();
        format!(
            "{}\n{} red  {} yellow  {} green",
            self.table(),
            count(HealthScore::Red).to_string().red(),
            count(HealthScore::Yellow).to_string().yellow(),
            count(HealthScore::Green).to_string().green()
        )
    }

    fn table(&self) -> String {
        table_of::<_, CustomerRow>(self, "No customers found.")
    }
}

impl Formattable for Vec<Alert> {
    fn pretty(&self) -> String {
        if self.is_empty() {
            return format!("{} No alerts", "✓".green());
        }
        self.iter()
            .map(|alert| {
                let marker = match alert.severity {
                    Severity::Red => "✗".red(),
                    Severity::Yellow => "⚠".yellow(),
                };
                let subject = match &alert.account_name {
                    Some(account) => format!("{} ({})", alert.title.bold(), account),
                    None => alert.title.bold().to_string(),
                };
                format!("{} {}\n  {}", marker, subject, alert.description.dimmed())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn table(&self) -> String {
        table_of::<_, AlertRow>(self, "No alerts.")
    }
}

impl Formattable for BaselineMetrics {
    fn pretty(&self) -> String {
        format_table(&baseline_rows(self), "")
    }
}

impl Formattable for Vec<Recommendation> {
    fn pretty(&self) -> String {
        if self.is_empty() {
            return "No recommendations.".to_string();
        }
        self.iter()
            .enumerate()
            .map(|(i, rec)| {
                let priority = match rec.priority {
                    Priority::Critical => rec.priority.as_str().red().bold(),
                    Priority::High => rec.priority.as_str().yellow(),
                    Priority::Medium => rec.priority.as_str().cyan(),
                    Priority::Low => rec.priority.as_str().dimmed(),
                };
                format!(
                    "{}. [{}] {}\n   {}\n   → {}\n   {} ARR, +{:.1} pts DM%, {}",
                    i + 1,
                    priority,
                    rec.title.bold(),
                    rec.description,
                    rec.suggested_action,
                    format_money(rec.estimated_arr_impact),
                    rec.estimated_dm_impact,
                    rec.timeframe
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn table(&self) -> String {
        table_of::<_, RecommendationRow>(self, "No recommendations.")
    }
}

impl Formattable for PortfolioSummary {
    fn pretty(&self) -> String {
        let c = &self.consolidated;
        format!(
            "{}\nWeighted DM% {} (target {}), {} at risk, {} recommendations ({} critical)",
            self.table(),
            format_pct(c.weighted_dm).bold(),
            format_pct(c.target_dm),
            format_money(c.total_at_risk_arr).red(),
            c.total_recommendations,
            c.critical_recommendations
        )
    }

    fn table(&self) -> String {
        table_of::<_, PortfolioRow>(&self.business_units, "No business units.")
    }
}

impl Formattable for Briefing {
    fn pretty(&self) -> String {
        match self {
            Briefing::Ready {
                summary,
                model,
                generated_at,
            } => format!(
                "{}\n{}",
                summary.trim(),
                format!(
                    "Generated by {} at {}",
                    model,
                    generated_at.format("%Y-%m-%d %H:%M UTC")
                )
                .dimmed()
            ),
            Briefing::NotConfigured { reason } => format!("{} {}", "○".dimmed(), reason),
        }
    }

    fn table(&self) -> String {
        match self {
            Briefing::Ready { summary, .. } => summary.trim().to_string(),
            Briefing::NotConfigured { reason } => truncate_string(reason, 120),
        }
    }
}

impl Formattable for CacheStats {
    fn pretty(&self) -> String {
        format!(
            "{} {} entries, {} gets, {} hits, {} misses ({:.0}% hit rate)",
            "Cache:".bold(),
            self.size,
            self.gets,
            self.hits.to_string().green(),
            self.misses.to_string().yellow(),
            self.hit_rate * 100.0
        )
    }

    fn table(&self) -> String {
        format!(
            "cache\tsize={}\tgets={}\thits={}\tmisses={}\thit_rate={:.2}",
            self.size, self.gets, self.hits, self.misses, self.hit_rate
        )
    }
}
