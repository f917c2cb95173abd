//! DM% (revenue retention) tracker records
//!
//! DM% is current recurring revenue over prior-year recurring revenue; the
//! portfolio target is 90%.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Retention target in percent
pub const DM_TARGET: f64 = 90.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmQuarter {
    pub quarter: String,
    pub rr: f64,
    pub dm_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuDm {
    pub bu: String,
    pub current_rr: f64,
    pub prior_rr: f64,
    pub dm_pct: f64,
    /// current_rr - prior_rr
    pub variance: f64,
    pub meets_target: bool,
    #[serde(default)]
    pub ttm_quarters: Vec<DmQuarter>,
}

impl BuDm {
    /// Percentage points below target
    pub fn gap(&self) -> f64 {
        DM_TARGET - self.dm_pct
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedDm {
    pub current_rr: f64,
    pub prior_rr: f64,
    pub dm_pct: f64,
    pub variance: f64,
    pub meets_target: bool,
    pub target: f64,
    #[serde(default)]
    pub ttm_quarters: Vec<DmQuarter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastQuarter {
    pub quarter: String,
    pub forecasted_rr: f64,
    pub forecasted_dm_pct: f64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmForecast {
    pub method: String,
    pub avg_quarterly_decline_rate: f64,
    #[serde(default)]
    pub quarters: Vec<ForecastQuarter>,
}

/// Full output of the DM% extraction script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmTrackerData {
    pub business_units: Vec<BuDm>,
    pub consolidated: ConsolidatedDm,
    pub forecast: DmForecast,
    pub extracted_at: String,
    pub fiscal_quarter: String,
}

impl DmTrackerData {
    pub fn validate(&self) -> Result<()> {
        if self.business_units.is_empty() {
            return Err(Error::Validation(
                "DM% data contains no business units".to_string(),
            ));
        }

        for bu in &self.business_units {
            if bu.bu.trim().is_empty() {
                return Err(Error::Validation("DM% row has an empty BU name".to_string()));
            }
            if !bu.dm_pct.is_finite() || !bu.current_rr.is_finite() || !bu.variance.is_finite() {
                return Err(Error::Validation(format!("{}: DM% figures are not numbers", bu.bu)));
            }
            if bu.current_rr < 0.0 || bu.prior_rr < 0.0 {
                return Err(Error::Validation(format!("{}: negative recurring revenue", bu.bu)));
            }
        }

        if !self.consolidated.dm_pct.is_finite() {
            return Err(Error::Validation(
                "consolidated DM% is not a number".to_string(),
            ));
        }

        Ok(())
    }
}
