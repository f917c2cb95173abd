//! Customer accounts and their health scoring inputs

use serde::{Deserialize, Serialize};

/// Renewal answers that count as at risk
const AT_RISK_RENEWALS: [&str; 3] = ["No", "No (SF)", "BU decision required"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub sub_id: Option<String>,
    #[serde(default)]
    pub arr: Option<f64>,
    #[serde(default)]
    pub renewal_qtr: Option<String>,
    /// "Yes", "No", "TBD", "No (SF)", "BU decision required"
    #[serde(default)]
    pub will_renew: Option<String>,
    #[serde(default)]
    pub projected_arr: Option<f64>,
}

impl Subscription {
    pub fn is_at_risk(&self) -> bool {
        self.will_renew
            .as_deref()
            .is_some_and(|answer| AT_RISK_RENEWALS.contains(&answer))
    }

    pub fn is_uncertain(&self) -> bool {
        self.will_renew.as_deref() == Some("TBD")
    }

    pub fn is_confirmed(&self) -> bool {
        self.will_renew.as_deref() == Some("Yes")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(alias = "customer_name")]
    pub name: String,
    /// Annotated from the owning BU when loaded
    #[serde(default)]
    pub bu: String,
    pub rr: f64,
    pub nrr: f64,
    pub total: f64,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthScore {
    Green,
    Yellow,
    Red,
}

impl HealthScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthScore::Green => "green",
            HealthScore::Yellow => "yellow",
            HealthScore::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerWithHealth {
    #[serde(flatten)]
    pub customer: Customer,
    pub health_score: HealthScore,
    pub health_factors: Vec<String>,
}
