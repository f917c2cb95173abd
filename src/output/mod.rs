//! Output formatting for CLI results

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod json;
pub mod section;
pub mod table;
mod views;

/// Section values that can be shown in every output format.
pub trait Formattable: Serialize {
    /// Human-oriented text with colour and summary lines
    fn pretty(&self) -> String;

    /// Plain tables only
    fn table(&self) -> String {
        self.pretty()
    }

    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.pretty()),
            OutputFormat::Table => Ok(self.table()),
            OutputFormat::Json => Ok(json::format_json(self)?),
        }
    }
}
