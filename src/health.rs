//! Health and diagnostics
//!
//! Reports collaborator status, cache counters and the resolved environment.
//! Nothing here goes through the cache.

use std::time::Duration;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::cache::{CacheStats, TtlCategory, TtlPolicy};
use crate::cli::AppContext;
use crate::models::display::common::format_age;
use crate::output::Formattable;
use crate::sources::{AdapterHealth, AdapterStatus};

/// Overall verdict derived from the adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Error,
}

impl HealthStatus {
    /// `Ok` when every adapter is connected, `Degraded` when any is degraded
    /// and none failed, otherwise `Error`.
    pub fn from_adapters(adapters: &[AdapterHealth]) -> Self {
        if adapters.iter().any(|a| a.status == AdapterStatus::Failed) {
            HealthStatus::Error
        } else if adapters.iter().any(|a| a.status == AdapterStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Error => "error",
        }
    }
}

/// Resolved settings worth showing when something is wrong.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    pub version: String,
    pub project_root: String,
    pub scripts_dir: String,
    pub database: String,
    pub ai_configured: bool,
    pub ai_model: String,
    pub demo_mode: bool,
    pub demo_multiplier: u32,
    /// Lifetimes in effect, after demo scaling
    pub cache_ttl: Vec<CategoryTtl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryTtl {
    pub category: TtlCategory,
    pub seconds: u64,
}

/// One entry per category, in [`TtlCategory::ALL`] order.
pub fn ttl_table(policy: &TtlPolicy) -> Vec<CategoryTtl> {
    TtlCategory::ALL
        .iter()
        .map(|&category| CategoryTtl {
            category,
            seconds: policy.get(category).as_secs(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub cache: CacheStats,
    pub adapters: Vec<AdapterHealth>,
    pub environment: Environment,
}

/// Assemble a report from already-gathered parts.
pub fn build(
    adapters: Vec<AdapterHealth>,
    cache: CacheStats,
    environment: Environment,
    now: DateTime<Utc>,
) -> HealthReport {
    HealthReport {
        status: HealthStatus::from_adapters(&adapters),
        timestamp: now,
        cache,
        adapters,
        environment,
    }
}

/// Probe every collaborator and snapshot the cache.
pub async fn collect(ctx: &AppContext) -> HealthReport {
    let adapters = ctx.data.sources().health().await;
    for adapter in adapters.iter().filter(|a| a.status != AdapterStatus::Connected) {
        log::warn!(
            "[{}] {}: {}",
            adapter.name,
            adapter.status,
            adapter.detail.as_deref().unwrap_or("no detail")
        );
    }

    let config = &ctx.config;
    let demo = config.demo_mode();
    let environment = Environment {
        version: env!("CARGO_PKG_VERSION").to_string(),
        project_root: config.project_root().display().to_string(),
        scripts_dir: config.scripts_dir().display().to_string(),
        database: config.database_path().display().to_string(),
        ai_configured: config.ai.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()),
        ai_model: ctx.data.sources().ai.model().to_string(),
        demo_mode: demo.enabled,
        demo_multiplier: demo.multiplier,
        cache_ttl: ttl_table(ctx.data.ttl()),
    };

    let purged = ctx.cache().purge_expired();
    if purged > 0 {
        log::debug!("Purged {} expired entries before snapshot", purged);
    }

    build(adapters, ctx.cache().stats(), environment, Utc::now())
}

impl Formattable for HealthReport {
    fn pretty(&self) -> String {
        let verdict = match self.status {
            HealthStatus::Ok => format!("{} All systems operational", "✓".green()),
            HealthStatus::Degraded => format!("{} Running degraded", "⚠".yellow()),
            HealthStatus::Error => format!("{} One or more sources unavailable", "✗".red()),
        };

        let mut lines = vec![verdict.bold().to_string(), String::new()];
        for adapter in &self.adapters {
            let marker = match adapter.status {
                AdapterStatus::Connected => "✓".green(),
                AdapterStatus::Degraded => "⚠".yellow(),
                AdapterStatus::Failed => "✗".red(),
            };
            let line = match &adapter.detail {
                Some(detail) => format!("{} {:<6} {} ({})", marker, adapter.name, adapter.status, detail),
                None => format!("{} {:<6} {}", marker, adapter.name, adapter.status),
            };
            lines.push(line);
        }

        let env = &self.environment;
        lines.push(String::new());
        lines.push(format!(
            "Cache: {} entries, {} hits, {} misses",
            self.cache.size, self.cache.hits, self.cache.misses
        ));
        let lifetimes: Vec<String> = env
            .cache_ttl
            .iter()
            .map(|t| format!("{} {}", t.category, format_age(Duration::from_secs(t.seconds))))
            .collect();
        lines.push(format!("Lifetimes: {}", lifetimes.join(", ")));
        lines.push(format!("Project root: {}", env.project_root.cyan()));
        lines.push(format!("Database:     {}", env.database.cyan()));
        if env.ai_configured {
            lines.push(format!("{} AI key configured (model {})", "✓".green(), env.ai_model));
        } else {
            lines.push(format!("{} AI key not configured", "○".dimmed()));
            lines.push("  → Set ANTHROPIC_API_KEY or run 'pintel init'".to_string());
        }
        if env.demo_mode {
            lines.push(format!(
                "{} Demo mode on (cache lifetimes x{})",
                "○".dimmed(),
                env.demo_multiplier
            ));
        }
        lines.push(format!("pintel {}", env.version).dimmed().to_string());
        lines.join("\n")
    }

    fn table(&self) -> String {
        let mut out = format!("status: {}\n", self.status.as_str());
        for adapter in &self.adapters {
            out.push_str(&format!(
                "{}\t{}\t{}\n",
                adapter.name,
                adapter.status,
                adapter.detail.as_deref().unwrap_or("-")
            ));
        }
        out.push_str(&format!(
            "cache\t{} entries\t{} hits / {} misses",
            self.cache.size, self.cache.hits, self.cache.misses
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::cli::OutputFormat;

    fn environment() -> Environment {
        Environment {
            version: "0.0.0".to_string(),
            project_root: "/srv/portfolio".to_string(),
            scripts_dir: "/srv/portfolio/scripts".to_string(),
            database: "/srv/portfolio/dev.db".to_string(),
            ai_configured: false,
            ai_model: "mock-model".to_string(),
            demo_mode: false,
            demo_multiplier: 6,
            cache_ttl: ttl_table(&TtlPolicy::default()),
        }
    }

    fn report(adapters: Vec<AdapterHealth>) -> HealthReport {
        build(adapters, Cache::default().stats(), environment(), Utc::now())
    }

    #[test]
    fn test_status_from_adapters() {
        let all_ok = [AdapterHealth::connected("excel"), AdapterHealth::connected("store")];
        assert_eq!(HealthStatus::from_adapters(&all_ok), HealthStatus::Ok);

        let degraded = [
            AdapterHealth::connected("excel"),
            AdapterHealth::degraded("ai", "no key"),
        ];
        assert_eq!(HealthStatus::from_adapters(&degraded), HealthStatus::Degraded);

        let failed = [
            AdapterHealth::degraded("ai", "no key"),
            AdapterHealth::failed("store", "cannot open"),
        ];
        assert_eq!(HealthStatus::from_adapters(&failed), HealthStatus::Error);

        assert_eq!(HealthStatus::from_adapters(&[]), HealthStatus::Ok);
    }

    #[test]
    fn test_report_json_shape() {
        let report = report(vec![
            AdapterHealth::connected("store"),
            AdapterHealth::degraded("ai", "ANTHROPIC_API_KEY not set"),
        ]);
        let out = report.format(OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed["data"]["status"], "degraded");
        assert_eq!(parsed["data"]["adapters"][1]["status"], "degraded");
        assert_eq!(parsed["data"]["cache"]["size"], 0);
        assert_eq!(parsed["data"]["environment"]["ai_configured"], false);
        assert!(parsed["data"]["adapters"][0].get("detail").is_none());
    }

    #[test]
    fn test_pretty_lists_every_adapter() {
        let out = report(vec![
            AdapterHealth::connected("excel"),
            AdapterHealth::failed("store", "unable to open database file"),
        ])
        .pretty();

        assert!(out.contains("excel"));
        assert!(out.contains("unable to open database file"));
        assert!(out.contains("AI key not configured"));
        assert!(out.contains("Lifetimes: FINANCIAL 5m, CUSTOMER 5m, AI_DERIVED 15m, STATIC 1h 0m"));
    }

    #[test]
    fn test_ttl_table_follows_active_policy() {
        let scaled = TtlPolicy::default().active(crate::cache::DemoMode {
            enabled: true,
            multiplier: 6,
        });
        let table = ttl_table(&scaled);

        assert_eq!(table.len(), TtlCategory::ALL.len());
        assert_eq!(table[0].category, TtlCategory::Financial);
        assert_eq!(table[0].seconds, 30 * 60);
        assert_eq!(table[3].seconds, 6 * 60 * 60);
    }

    #[tokio::test]
    async fn test_report_over_mock_sources() {
        let (_mock, data) = crate::data::testing::populated().await;
        let adapters = data.sources().health().await;
        let report = build(adapters, data.cache().stats(), environment(), Utc::now());

        assert_eq!(report.adapters.len(), 3);
        assert_eq!(report.status, HealthStatus::from_adapters(&report.adapters));
    }
}
