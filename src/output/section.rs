//! One renderer for every report section
//!
//! A section either shows its value or a labelled degraded state; a failed
//! section never stops the others from rendering.

use colored::Colorize;
use serde_json::{Value, json};

use super::Formattable;
use super::json::{ErrorBody, format_json_error};
use crate::cli::OutputFormat;
use crate::data::Section;
use crate::error::Result;

const RULE_WIDTH: usize = 48;

fn heading(section: Section, format: OutputFormat) -> String {
    match format {
        OutputFormat::Pretty => format!(
            "{}\n{}",
            section.title().bold(),
            "─".repeat(RULE_WIDTH).dimmed()
        ),
        _ => section.title().to_string(),
    }
}

/// The text for one section: its value, or `⚠ <Section> unavailable: <message>`.
pub fn render<T: Formattable>(section: Section, result: &Result<T>, format: OutputFormat) -> String {
    let body = result.as_ref().map_err(Clone::clone).and_then(|value| value.format(format));

    match (format, body) {
        (OutputFormat::Json, Ok(text)) => text,
        (OutputFormat::Json, Err(err)) => format_json_error(&err).unwrap_or_else(|_| {
            json!({"error": {"kind": err.kind(), "message": err.to_string()}}).to_string()
        }),
        (_, Ok(text)) => format!("{}\n{}\n", heading(section, format), text),
        (_, Err(err)) => {
            log::debug!("{} degraded: {:?}", section, err);
            let line = format!("⚠ {} unavailable: {}", section.title(), err);
            let line = if matches!(format, OutputFormat::Pretty) {
                line.yellow().to_string()
            } else {
                line
            };
            format!("{}\n{}\n", heading(section, format), line)
        }
    }
}

/// Print [`render`] output to stdout.
pub fn print<T: Formattable>(section: Section, result: &Result<T>, format: OutputFormat) {
    println!("{}", render(section, result, format));
}

/// `{"data": ...}` or `{"error": {...}}` for embedding in a combined report.
pub fn to_json<T: Formattable>(result: &Result<T>) -> Value {
    let outcome = result
        .as_ref()
        .map_err(Clone::clone)
        .and_then(|value| Ok(serde_json::to_value(value)?));

    match outcome {
        Ok(data) => json!({ "data": data }),
        Err(err) => json!({ "error": ErrorBody::from(&err) }),
    }
}
