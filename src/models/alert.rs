//! Proactive alerts

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Alert severity; red sorts before yellow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Red,
    Yellow,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Red => "red",
            Severity::Yellow => "yellow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    pub metric_name: String,
    pub current_value: String,
    pub threshold: String,
    pub timestamp: DateTime<Utc>,
}
