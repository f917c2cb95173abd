//! AI-generated DM% briefing

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Either a generated briefing or a labelled placeholder when no AI
/// provider is configured.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Briefing {
    Ready {
        summary: String,
        model: String,
        generated_at: DateTime<Utc>,
    },
    NotConfigured {
        reason: String,
    },
}
