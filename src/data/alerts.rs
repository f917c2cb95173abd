//! Proactive alerts over customers and BU margins

use chrono::{DateTime, Utc};

use super::{DataLayer, keys};
use crate::cache::TtlCategory;
use crate::error::Result;
use crate::models::{Alert, BuSummary, CustomerWithHealth, HealthScore, Severity};

/// Receivables older than 90 days across the portfolio
const AGED_RECEIVABLES: f64 = 1_280_000.0;

/// Accounts listed per health band
const HEALTH_ALERT_LIMIT: usize = 5;

/// Largest accounts checked for aged receivables
const AR_CHECK_LIMIT: usize = 10;

const MARGIN_GAP_WARN: f64 = 5.0;
const MARGIN_GAP_RED: f64 = 10.0;
const AR_SHARE_LIMIT_PCT: f64 = 20.0;

fn thousands(amount: f64) -> String {
    format!("${:.0}K", amount / 1000.0)
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

struct AlertBuilder {
    now: DateTime<Utc>,
    alerts: Vec<Alert>,
}

impl AlertBuilder {
    fn account(
        &mut self,
        kind: &str,
        severity: Severity,
        title: &str,
        description: String,
        customer: &CustomerWithHealth,
        metric: (&str, String, &str),
    ) {
        let name = &customer.customer.name;
        self.alerts.push(Alert {
            id: format!("{}-{}", kind, name),
            severity,
            title: title.to_string(),
            description,
            account_name: Some(name.clone()),
            metric_name: metric.0.to_string(),
            current_value: metric.1,
            threshold: metric.2.to_string(),
            timestamp: self.now,
        });
    }
}

/// Build the alert list, red first. Ids are stable across runs.
pub fn build_alerts(
    customers: &[CustomerWithHealth],
    bus: &[BuSummary],
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut out = AlertBuilder {
        now,
        alerts: Vec::new(),
    };

    for c in customers {
        let at_risk: Vec<_> = c
            .customer
            .subscriptions
            .iter()
            .filter(|s| s.is_at_risk())
            .collect();
        if at_risk.is_empty() {
            continue;
        }
        let arr: f64 = at_risk.iter().filter_map(|s| s.arr).sum();
        out.account(
            "renewal-risk",
            Severity::Red,
            "Renewal at Risk",
            format!(
                "{} subscription{} at renewal risk with total ARR {}",
                at_risk.len(),
                plural(at_risk.len()),
                thousands(arr)
            ),
            c,
            ("Renewal Status", format!("{} at risk", at_risk.len()), "0 expected"),
        );
    }

    for c in customers {
        if c.customer.rr == 0.0 && c.customer.nrr > 0.0 {
            out.account(
                "churn-signal",
                Severity::Red,
                "Churn Signal - No Recurring Revenue",
                format!(
                    "Customer has {} NRR but zero recurring revenue",
                    thousands(c.customer.nrr)
                ),
                c,
                ("Recurring Revenue", "$0".to_string(), "> $0"),
            );
        }
    }

    let bands = [
        (HealthScore::Red, "health-critical", Severity::Red, "Critical Account Health", "Critical"),
        (HealthScore::Yellow, "health-warning", Severity::Yellow, "Account At Risk", "At Risk"),
    ];
    for (score, kind, severity, title, label) in bands {
        for c in customers
            .iter()
            .filter(|c| c.health_score == score)
            .take(HEALTH_ALERT_LIMIT)
        {
            out.account(
                kind,
                severity,
                title,
                c.health_factors.join("; "),
                c,
                ("Health Score", label.to_string(), "Healthy"),
            );
        }
    }

    for bu in bus {
        let gap = bu.margin_gap();
        if gap <= MARGIN_GAP_WARN {
            continue;
        }
        out.alerts.push(Alert {
            id: format!("margin-gap-{}", bu.bu),
            severity: if gap > MARGIN_GAP_RED {
                Severity::Red
            } else {
                Severity::Yellow
            },
            title: format!("{} Margin Below Target", bu.bu),
            description: format!("Net margin is {:.1} percentage points below target", gap),
            account_name: None,
            metric_name: "Net Margin".to_string(),
            current_value: format!("{:.1}%", bu.net_margin_pct),
            threshold: format!("{:.1}%", bu.net_margin_target),
            timestamp: now,
        });
    }

    let total_revenue: f64 = customers.iter().map(|c| c.customer.total).sum();
    if total_revenue > 0.0 {
        for c in customers.iter().take(AR_CHECK_LIMIT) {
            if c.customer.total <= 0.0 {
                continue;
            }
            let aged = c.customer.total / total_revenue * AGED_RECEIVABLES;
            let share = aged / c.customer.total * 100.0;
            if share > AR_SHARE_LIMIT_PCT {
                out.account(
                    "ar-aging",
                    Severity::Red,
                    "High Aged Receivables",
                    format!("{:.1}% of revenue in AR > 90 days", share),
                    c,
                    ("AR > 90 Days", thousands(aged), "< 5% of revenue"),
                );
            }
        }
    }

    // Stable: keeps rule order within a severity
    out.alerts.sort_by_key(|a| a.severity);
    out.alerts
}

impl DataLayer {
    pub async fn proactive_alerts(&self) -> Result<Vec<Alert>> {
        let this = self.clone();
        self.cache
            .get(
                keys::ALERTS,
                move || async move {
                    let (customers, bus) =
                        tokio::try_join!(this.all_customers_with_health(), this.bu_summaries())?;
                    let alerts = build_alerts(&customers, &bus, Utc::now());
                    log::debug!("Generated {} alerts", alerts.len());
                    Ok(alerts)
                },
                self.options(TtlCategory::Customer),
            )
            .await
    }
}
