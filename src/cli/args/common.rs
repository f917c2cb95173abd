//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - headings, colour and summary lines
    #[default]
    Pretty,
    /// Table format - plain tables, one row per record
    Table,
    /// JSON format - structured for scripts/APIs
    Json,
}
