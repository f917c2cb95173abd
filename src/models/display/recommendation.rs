//! Recommendation and portfolio display models

use serde::Serialize;
use tabled::Tabled;

use super::common::{format_money, format_pct, truncate_string};
use crate::models::{BuPortfolio, Recommendation};

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct RecommendationRow {
    #[tabled(rename = "PRIORITY")]
    pub priority: String,

    #[tabled(rename = "BU")]
    pub bu: String,

    #[tabled(rename = "TYPE")]
    pub kind: String,

    #[tabled(rename = "TITLE")]
    pub title: String,

    #[tabled(rename = "ARR IMPACT")]
    pub arr_impact: String,

    #[tabled(rename = "DM% IMPACT")]
    pub dm_impact: String,

    #[tabled(rename = "EFFORT")]
    pub effort: String,

    #[tabled(rename = "TIMEFRAME")]
    pub timeframe: String,
}

impl From<&Recommendation> for RecommendationRow {
    fn from(rec: &Recommendation) -> Self {
        Self {
            priority: rec.priority.as_str().to_string(),
            bu: rec.bu.clone(),
            kind: rec.kind.as_str().to_string(),
            title: truncate_string(&rec.title, 45),
            arr_impact: format_money(rec.estimated_arr_impact),
            dm_impact: format!("+{:.1} pts", rec.estimated_dm_impact),
            effort: rec.estimated_effort.as_str().to_string(),
            timeframe: rec.timeframe.clone(),
        }
    }
}

#[derive(Debug, Clone, Tabled, Serialize)]
pub struct PortfolioRow {
    #[tabled(rename = "BU")]
    pub bu: String,

    #[tabled(rename = "DM%")]
    pub dm: String,

    #[tabled(rename = "GAP")]
    pub gap: String,

    #[tabled(rename = "ARR")]
    pub arr: String,

    #[tabled(rename = "AT RISK")]
    pub at_risk: String,

    #[tabled(rename = "RECS")]
    pub recs: usize,

    #[tabled(rename = "CRITICAL")]
    pub critical: usize,

    #[tabled(rename = "IMPACT")]
    pub impact: String,
}

impl From<&BuPortfolio> for PortfolioRow {
    fn from(bu: &BuPortfolio) -> Self {
        Self {
            bu: bu.bu.clone(),
            dm: format_pct(bu.current_dm),
            gap: format!("{:.1} pts", bu.dm_gap),
            arr: format_money(bu.current_arr),
            at_risk: format_money(bu.at_risk_arr),
            recs: bu.recommendation_count,
            critical: bu.critical_count,
            impact: format_money(bu.total_estimated_impact),
        }
    }
}
