//! Customer and alert display models

use serde::Serialize;
use tabled::Tabled;

use super::common::{format_money, truncate_string};
use crate::models::{Alert, CustomerWithHealth};

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct CustomerRow {
    #[tabled(rename = "CUSTOMER")]
    pub name: String,

    #[tabled(rename = "BU")]
    pub bu: String,

    #[tabled(rename = "RR")]
    pub rr: String,

    #[tabled(rename = "NRR")]
    pub nrr: String,

    #[tabled(rename = "TOTAL")]
    pub total: String,

    #[tabled(rename = "HEALTH")]
    pub health: String,

    #[tabled(rename = "FACTORS")]
    pub factors: String,
}

impl From<&CustomerWithHealth> for CustomerRow {
    fn from(c: &CustomerWithHealth) -> Self {
        Self {
            name: truncate_string(&c.customer.name, 30),
            bu: c.customer.bu.clone(),
            rr: format_money(c.customer.rr),
            nrr: format_money(c.customer.nrr),
            total: format_money(c.customer.total),
            health: c.health_score.as_str().to_string(),
            factors: truncate_string(&c.health_factors.join("; "), 50),
        }
    }
}

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct AlertRow {
    #[tabled(rename = "SEVERITY")]
    pub severity: String,

    #[tabled(rename = "ALERT")]
    pub title: String,

    #[tabled(rename = "ACCOUNT")]
    pub account: String,

    #[tabled(rename = "CURRENT")]
    pub current: String,

    #[tabled(rename = "THRESHOLD")]
    pub threshold: String,
}

impl From<&Alert> for AlertRow {
    fn from(alert: &Alert) -> Self {
        Self {
            severity: alert.severity.as_str().to_string(),
            title: truncate_string(&alert.title, 40),
            account: alert.account_name.clone().unwrap_or_else(|| "--".to_string()),
            current: alert.current_value.clone(),
            threshold: alert.threshold.clone(),
        }
    }
}
