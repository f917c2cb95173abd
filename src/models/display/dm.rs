//! DM% tracker display models

use serde::Serialize;
use tabled::Tabled;

use super::common::{format_money, format_pct};
use crate::models::dm::{BuDm, ForecastQuarter};

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct DmRow {
    #[tabled(rename = "BU")]
    pub bu: String,

    #[tabled(rename = "DM%")]
    pub dm: String,

    #[tabled(rename = "CURRENT RR")]
    pub current: String,

    #[tabled(rename = "PRIOR RR")]
    pub prior: String,

    #[tabled(rename = "VARIANCE")]
    pub variance: String,

    #[tabled(rename = "STATUS")]
    pub status: String,
}

impl From<&BuDm> for DmRow {
    fn from(bu: &BuDm) -> Self {
        Self {
            bu: bu.bu.clone(),
            dm: format_pct(bu.dm_pct),
            current: format_money(bu.current_rr),
            prior: format_money(bu.prior_rr),
            variance: format_money(bu.variance),
            status: if bu.meets_target {
                "\u{2713} on target".to_string()
            } else {
                format!("{:.1} pts below", bu.gap())
            },
        }
    }
}

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ForecastRow {
    #[tabled(rename = "QUARTER")]
    pub quarter: String,

    #[tabled(rename = "FORECAST RR")]
    pub rr: String,

    #[tabled(rename = "FORECAST DM%")]
    pub dm: String,

    #[tabled(rename = "CONFIDENCE")]
    pub confidence: String,
}

impl From<&ForecastQuarter> for ForecastRow {
    fn from(q: &ForecastQuarter) -> Self {
        Self {
            quarter: q.quarter.clone(),
            rr: format_money(q.forecasted_rr),
            dm: format_pct(q.forecasted_dm_pct),
            confidence: q.confidence.as_str().to_string(),
        }
    }
}
