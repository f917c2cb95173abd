//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod completions;
pub mod context;
pub mod health;
pub mod init;
pub mod report;
pub mod sections;
pub mod seed;

pub use args::{CustomerFilterArgs, GlobalOptions, OutputFormat, RecommendationFilterArgs};
pub use context::AppContext;

use crate::data::Section;

/// Portfolio Intelligence - cached business reports over spreadsheets, the customer database and AI
#[derive(Parser, Debug)]
#[command(name = "pintel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "PINTEL_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "PINTEL_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "PINTEL_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Stretch cache lifetimes for live demos
    #[arg(long, global = true)]
    pub demo_mode: bool,

    /// Seconds to wait for a section's data before showing it as unavailable
    #[arg(
        long,
        global = true,
        env = "PINTEL_TIMEOUT",
        hide_env = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Revenue, EBITDA and margin overview with per-BU breakdown and trend
    Dashboard,

    /// DM% by business unit with forecast
    DmTracker,

    /// Customers with health scores
    Customers {
        #[command(flatten)]
        filters: CustomerFilterArgs,
    },

    /// Proactive alerts, most severe first
    Alerts,

    /// Current-state metrics for scenario modelling
    Baseline,

    /// DM% improvement recommendations
    Recommendations {
        #[command(flatten)]
        filters: RecommendationFilterArgs,

        /// Critical and high priority only, largest ARR impact first
        #[arg(long)]
        urgent: bool,
    },

    /// Portfolio roll-up of DM% and recommendation counts
    Portfolio,

    /// AI-written briefing on the DM% tracker
    Briefing,

    /// Every section in one run, followed by cache statistics
    Report,

    /// Prefetch every section into the cache
    Warmup,

    /// Re-render one section on a timer
    Watch {
        /// Section to show
        #[arg(value_enum)]
        section: Section,

        /// Seconds between renders
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Stop after this many renders (default: run until interrupted)
        #[arg(long)]
        iterations: Option<u32>,

        /// Drop cached data before every render
        #[arg(long)]
        refresh: bool,
    },

    /// Show collaborator status, cache statistics and environment
    Health,

    /// Initialize portfolio-intel configuration
    Init,

    /// Load customer records from a JSON file into the database
    Seed {
        /// JSON array of customers with their subscriptions
        file: PathBuf,
    },

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  bash:   pintel completion bash > /etc/bash_completion.d/pintel
  zsh:    pintel completion zsh > \"${fpath[1]}/_pintel\"
  fish:   pintel completion fish > ~/.config/fish/completions/pintel.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_recommendation_filters() {
        let cli = Cli::parse_from([
            "pintel",
            "recommendations",
            "--priority",
            "critical",
            "--type",
            "retention",
            "--limit",
            "2",
        ]);
        match cli.command {
            Commands::Recommendations { filters, urgent } => {
                assert!(!urgent);
                assert_eq!(filters.limit, Some(2));
                assert_eq!(filters.priority, Some(crate::models::Priority::Critical));
                assert_eq!(filters.kind, Some(crate::models::RecommendationType::Retention));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_watch() {
        let cli = Cli::parse_from(["pintel", "watch", "bu-summaries", "--iterations", "2"]);
        match cli.command {
            Commands::Watch {
                section,
                interval,
                iterations,
                refresh,
            } => {
                assert!(!refresh);
                assert_eq!(section, Section::BuSummaries);
                assert_eq!(interval, 30);
                assert_eq!(iterations, Some(2));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["pintel", "--timeout", "0", "health"]).is_err());
    }
}
