//! AI-written DM% briefing

use std::fmt::Write;
use std::sync::Arc;

use chrono::Utc;

use super::DataLayer;
use crate::cache::{TtlCategory, prompt_key};
use crate::error::{Error, Result, guard};
use crate::models::{Briefing, DM_TARGET, DmTrackerData};
use crate::sources::ai;

const SYSTEM_PROMPT: &str = "You are a portfolio finance analyst. Write a concise briefing \
(at most five bullet points) on revenue retention for an executive audience. Lead with the \
business units furthest from target and name one concrete action for each.";

/// User prompt with one line per business unit. Identical data gives an
/// identical prompt, so the completion is reused until the data changes.
pub fn briefing_prompt(data: &DmTrackerData) -> String {
    let mut prompt = format!(
        "DM% retention for {} (target {:.0}%).\n",
        data.fiscal_quarter, DM_TARGET
    );
    for bu in &data.business_units {
        let _ = writeln!(
            prompt,
            "- {}: DM% {:.1}, recurring revenue ${:.0}K vs ${:.0}K prior ({}).",
            bu.bu,
            bu.dm_pct,
            bu.current_rr / 1000.0,
            bu.prior_rr / 1000.0,
            if bu.meets_target { "meets target" } else { "below target" }
        );
    }
    let _ = writeln!(
        prompt,
        "Consolidated DM% {:.1}; forecast method {} with average quarterly decline {:.1}%.",
        data.consolidated.dm_pct, data.forecast.method, data.forecast.avg_quarterly_decline_rate
    );
    prompt
}

impl DataLayer {
    /// Briefing over the current DM% data.
    ///
    /// An unconfigured AI provider is not an error: the result is
    /// [`Briefing::NotConfigured`] and nothing is cached for it, so setting a
    /// key takes effect on the next call.
    pub async fn dm_briefing(&self) -> Result<Briefing> {
        let data = self.dm_tracker().await?;
        let prompt = briefing_prompt(&data);
        let key = prompt_key(SYSTEM_PROMPT, &prompt);
        let client = Arc::clone(&self.sources.ai);

        let outcome = self
            .cache
            .get(
                &key,
                move || {
                    guard(ai::ADAPTER, async move {
                        let summary = client.complete(SYSTEM_PROMPT, &prompt).await?;
                        Ok(Briefing::Ready {
                            summary,
                            model: client.model().to_string(),
                            generated_at: Utc::now(),
                        })
                    })
                },
                self.options(TtlCategory::AiDerived),
            )
            .await;

        match outcome {
            Err(Error::NotConfigured(what)) => Ok(Briefing::NotConfigured {
                reason: format!(
                    "{} is not configured. Set ANTHROPIC_API_KEY to enable briefings.",
                    what
                ),
            }),
            other => other,
        }
    }
}
