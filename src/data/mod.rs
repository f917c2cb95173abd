//! Cached data adapters
//!
//! Every adapter has the same shape: build a stable key, hand a producer to
//! the cache with the lifetime of its data category, and return the cached
//! [`Result`] unchanged. Producers call the collaborators in
//! [`crate::sources`] through [`crate::error::guard`] so every failure comes
//! back tagged with the adapter that caused it.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::cache::{Cache, EntryInfo, GetOptions, TtlCategory, TtlPolicy, cache_key};
use crate::error::Result;
use crate::sources::{CustomerFilter, Sources};

pub mod alerts;
pub mod briefing;
pub mod customers;
pub mod dashboard;
pub mod dm_tracker;
pub mod recommendations;
pub mod scenario;

/// Cache keys shared by more than one caller
pub mod keys {
    pub const FINANCIALS: &str = "excel:financials";
    pub const DASHBOARD_OVERVIEW: &str = "dashboard:overview";
    pub const BU_SUMMARIES: &str = "dashboard:bu-summaries";
    pub const REVENUE_TREND: &str = "dashboard:revenue-trend";
    pub const DM_TRACKER: &str = "dm-tracker:data";
    pub const CUSTOMERS: &str = "customers";
    pub const ALERTS: &str = "alerts:proactive";
    pub const BASELINE: &str = "scenario:baseline";
    pub const RECOMMENDATIONS: &str = "dm-strategy:recommendations";
    pub const PORTFOLIO: &str = "dm-strategy:portfolio-summary";
}

/// Handle to every adapter. Cheap to clone.
#[derive(Clone)]
pub struct DataLayer {
    cache: Cache,
    ttl: TtlPolicy,
    sources: Sources,
}

impl DataLayer {
    /// `ttl` is the active policy, already scaled for demo mode.
    pub fn new(cache: Cache, ttl: TtlPolicy, sources: Sources) -> Self {
        Self {
            cache,
            ttl,
            sources,
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn ttl(&self) -> &TtlPolicy {
        &self.ttl
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// Freshness of the raw extraction `section` is computed from, if cached.
    ///
    /// Derived sections live no longer than their source, so this bounds the
    /// age of what is on screen.
    pub fn source_freshness(&self, section: Section) -> Option<EntryInfo> {
        let key = match section {
            Section::Dashboard
            | Section::BuSummaries
            | Section::RevenueTrend
            | Section::Baseline => keys::FINANCIALS.to_string(),
            Section::DmTracker
            | Section::Recommendations
            | Section::Portfolio
            | Section::Briefing => keys::DM_TRACKER.to_string(),
            Section::Customers | Section::Alerts => {
                cache_key(keys::CUSTOMERS, &CustomerFilter::default()).ok()?
            }
        };
        self.cache.entry_info(&key)
    }

    fn options(&self, category: TtlCategory) -> GetOptions {
        GetOptions::ttl(self.ttl.get(category))
    }

    /// Populate the cache for one section, discarding the value.
    pub async fn prefetch(&self, section: Section) -> Result<()> {
        match section {
            Section::Dashboard => self.dashboard_summary().await.map(drop),
            Section::BuSummaries => self.bu_summaries().await.map(drop),
            Section::RevenueTrend => self.revenue_trend().await.map(drop),
            Section::DmTracker => self.dm_tracker().await.map(drop),
            Section::Customers => self.all_customers_with_health().await.map(drop),
            Section::Alerts => self.proactive_alerts().await.map(drop),
            Section::Baseline => self.baseline_metrics().await.map(drop),
            Section::Recommendations => self.recommendations(&Default::default()).await.map(drop),
            Section::Portfolio => self.portfolio_summary().await.map(drop),
            Section::Briefing => self.dm_briefing().await.map(drop),
        }
    }
}

/// Renderable report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Dashboard,
    BuSummaries,
    RevenueTrend,
    DmTracker,
    Customers,
    Alerts,
    Baseline,
    Recommendations,
    Portfolio,
    Briefing,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::Dashboard,
        Section::BuSummaries,
        Section::RevenueTrend,
        Section::DmTracker,
        Section::Customers,
        Section::Alerts,
        Section::Baseline,
        Section::Recommendations,
        Section::Portfolio,
        Section::Briefing,
    ];

    /// Heading used in rendered output
    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::BuSummaries => "Business Units",
            Section::RevenueTrend => "Revenue Trend",
            Section::DmTracker => "DM% Tracker",
            Section::Customers => "Customers",
            Section::Alerts => "Alerts",
            Section::Baseline => "Scenario Baseline",
            Section::Recommendations => "Recommendations",
            Section::Portfolio => "DM% Portfolio",
            Section::Briefing => "DM% Briefing",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefetch_every_section() {
        let (mock, data) = testing::populated().await;

        for section in Section::ALL {
            if section == Section::Briefing {
                // Unconfigured AI degrades to a placeholder, which is still Ok
                assert!(data.prefetch(section).await.is_ok());
                continue;
            }
            data.prefetch(section).await.unwrap();
        }

        let counts = mock.call_counts().await;
        assert_eq!(counts.financials, 1);
        assert_eq!(counts.dm_tracker, 1);
        assert_eq!(counts.find_customers, 1);
    }

    #[tokio::test]
    async fn test_source_freshness_tracks_extraction() {
        let (_mock, data) = testing::populated().await;
        assert!(data.source_freshness(Section::Baseline).is_none());

        data.baseline_metrics().await.unwrap();
        data.proactive_alerts().await.unwrap();

        let financials = data.source_freshness(Section::Baseline).unwrap();
        assert!(financials.ttl_remaining <= data.ttl().financial);
        assert!(data.source_freshness(Section::Alerts).is_some());
        assert!(data.source_freshness(Section::Portfolio).is_none());
    }

    #[tokio::test]
    async fn test_prefetch_reports_missing_upstream() {
        let (_mock, data) = testing::empty();
        let err = data.prefetch(Section::Dashboard).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
