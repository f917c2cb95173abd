//! Multi-section commands: report, warmup and watch

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use serde::Serialize;
use serde_json::json;

use super::sections::{Text, collect_json, fetch, fetch_all, slug};
use crate::cache::EntryInfo;
use crate::cli::{AppContext, OutputFormat};
use crate::data::{DataLayer, Section};
use crate::error::{Error, Result};
use crate::models::display::common::format_age;
use crate::output::Formattable;
use crate::output::json::{ErrorBody, JsonOutput};

/// Every section, concurrently, then cache statistics.
pub async fn report(ctx: &AppContext) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            let sections = collect_json(&ctx.data, &Section::ALL).await;
            let doc = json!({ "sections": sections, "cache": ctx.cache().stats() });
            println!("{}", serde_json::to_string_pretty(&JsonOutput::new(doc))?);
        }
        format => {
            for text in fetch_all(&ctx.data, &Section::ALL, &Text(format)).await {
                println!("{}", text);
            }
            println!("{}", ctx.cache().stats().format(format)?);
        }
    }
    Ok(())
}

/// Outcome of prefetching one section.
#[derive(Debug, Serialize)]
pub struct Warmed {
    pub section: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Prefetch every section in `sections`, reporting progress on `bar`.
///
/// Results come back in `sections` order regardless of completion order.
pub async fn prefetch_all(
    data: &DataLayer,
    sections: &[Section],
    bar: &ProgressBar,
) -> Vec<(Section, Result<()>)> {
    let mut pending: FuturesUnordered<_> = sections
        .iter()
        .enumerate()
        .map(|(i, &section)| async move { (i, section, data.prefetch(section).await) })
        .collect();

    let mut done = Vec::with_capacity(sections.len());
    while let Some((i, section, result)) = pending.next().await {
        bar.set_message(section.title());
        bar.inc(1);
        done.push((i, section, result));
    }

    done.sort_by_key(|(i, _, _)| *i);
    done.into_iter().map(|(_, section, result)| (section, result)).collect()
}

fn progress_bar(len: usize, format: OutputFormat) -> Result<ProgressBar> {
    if format == OutputFormat::Json {
        return Ok(ProgressBar::hidden());
    }

    let style = ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .map_err(|e| Error::Other(format!("progress template: {}", e)))?
        .progress_chars("=> ");
    let bar = ProgressBar::new(len as u64);
    bar.set_style(style);
    Ok(bar)
}

/// Prefetch every section into the cache.
pub async fn warmup(ctx: &AppContext) -> Result<()> {
    let bar = progress_bar(Section::ALL.len(), ctx.format)?;
    let started = Instant::now();
    let outcomes = prefetch_all(&ctx.data, &Section::ALL, &bar).await;
    bar.finish_and_clear();
    let elapsed = started.elapsed();
    debug!("Warmup finished in {:?}", elapsed);

    let warmed: Vec<Warmed> = outcomes
        .iter()
        .map(|(section, result)| Warmed {
            section: slug(*section),
            error: result.as_ref().err().map(ErrorBody::from),
        })
        .collect();

    match ctx.format {
        OutputFormat::Json => {
            let doc = json!({
                "sections": warmed,
                "elapsed_ms": elapsed.as_millis() as u64,
                "cache": ctx.cache().stats(),
            });
            println!("{}", serde_json::to_string_pretty(&JsonOutput::new(doc))?);
        }
        format => {
            for (section, result) in &outcomes {
                match result {
                    Ok(()) => println!("{} {}", "✓".green(), section.title()),
                    Err(err) => println!("{} {}: {}", "⚠".yellow(), section.title(), err),
                }
            }
            let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
            println!(
                "\nWarmed {} of {} sections in {:.1}s",
                outcomes.len() - failed,
                outcomes.len(),
                elapsed.as_secs_f64()
            );
            println!("{}", ctx.cache().stats().format(format)?);
        }
    }
    Ok(())
}

/// `data 3m old, expires in 2m` for the source behind a section.
pub fn freshness_label(info: Option<EntryInfo>, now: DateTime<Utc>) -> String {
    match info {
        Some(info) => {
            let age = (now - info.created_at).to_std().unwrap_or_default();
            format!(
                "data {} old, expires in {}",
                format_age(age),
                format_age(info.ttl_remaining)
            )
        }
        None => "no cached data".to_string(),
    }
}

/// Re-render `section` every `interval` against the same cache.
///
/// With `refresh`, the cache is cleared before each render so every render
/// re-extracts. Runs until `iterations` renders have been shown or Ctrl-C.
pub async fn watch(
    ctx: &AppContext,
    section: Section,
    interval: Duration,
    iterations: Option<u32>,
    refresh: bool,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    let mut rendered = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                debug!("Watch interrupted after {} renders", rendered);
                break;
            }
        }

        if refresh {
            ctx.cache().clear();
        }

        let text = fetch(&ctx.data, section, &Text(ctx.format)).await;
        if ctx.format == OutputFormat::Pretty {
            let stamp = format!(
                "Refreshed {}, {} (every {}s, Ctrl-C to stop)",
                Local::now().format("%H:%M:%S"),
                freshness_label(ctx.data.source_freshness(section), Utc::now()),
                interval.as_secs()
            );
            println!("{}", stamp.dimmed());
        }
        println!("{}", text);

        rendered += 1;
        if iterations.is_some_and(|limit| rendered >= limit) {
            break;
        }
    }
    Ok(())
}
