//! Section commands
//!
//! Every section is fetched through the data layer and printed with
//! [`output::section`]; a failed section prints its degraded state and the
//! command still succeeds.

use futures::future::join_all;
use serde_json::{Map, Value};

use crate::cli::{AppContext, CustomerFilterArgs, OutputFormat, RecommendationFilterArgs};
use crate::data::{DataLayer, Section};
use crate::error::Result;
use crate::models::{Recommendation, RecommendationFilters};
use crate::output::json::JsonOutput;
use crate::output::{self, Formattable};
use crate::sources::CustomerFilter;

/// Default size of the `--urgent` list
const URGENT_LIMIT: usize = 5;

/// Receives one section outcome, whatever its value type.
pub trait SectionSink {
    type Output;

    fn emit<T: Formattable>(&self, section: Section, result: &Result<T>) -> Self::Output;
}

/// Rendered text in the chosen format.
pub struct Text(pub OutputFormat);

impl SectionSink for Text {
    type Output = String;

    fn emit<T: Formattable>(&self, section: Section, result: &Result<T>) -> String {
        output::section::render(section, result, self.0)
    }
}

/// `{"data": ...}` or `{"error": ...}` for a combined JSON document.
pub struct Embedded;

impl SectionSink for Embedded {
    type Output = Value;

    fn emit<T: Formattable>(&self, _section: Section, result: &Result<T>) -> Value {
        output::section::to_json(result)
    }
}

/// Fetch one section with default parameters and hand the outcome to `sink`.
pub async fn fetch<S: SectionSink>(data: &DataLayer, section: Section, sink: &S) -> S::Output {
    match section {
        Section::Dashboard => sink.emit(section, &data.dashboard_summary().await),
        Section::BuSummaries => sink.emit(section, &data.bu_summaries().await),
        Section::RevenueTrend => sink.emit(section, &data.revenue_trend().await),
        Section::DmTracker => sink.emit(section, &data.dm_tracker().await),
        Section::Customers => sink.emit(section, &data.all_customers_with_health().await),
        Section::Alerts => sink.emit(section, &data.proactive_alerts().await),
        Section::Baseline => sink.emit(section, &data.baseline_metrics().await),
        Section::Recommendations => {
            sink.emit(section, &data.recommendations(&Default::default()).await)
        }
        Section::Portfolio => sink.emit(section, &data.portfolio_summary().await),
        Section::Briefing => sink.emit(section, &data.dm_briefing().await),
    }
}

/// JSON object key for a section (`bu-summaries`, `dm-tracker`, ...).
pub fn slug(section: Section) -> String {
    serde_json::to_value(section)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| section.title().to_string())
}

/// Fetch `sections` concurrently; outputs come back in the given order.
pub async fn fetch_all<S: SectionSink>(
    data: &DataLayer,
    sections: &[Section],
    sink: &S,
) -> Vec<S::Output> {
    join_all(sections.iter().map(|s| fetch(data, *s, sink))).await
}

/// Section outcomes keyed by [`slug`].
pub async fn collect_json(data: &DataLayer, sections: &[Section]) -> Map<String, Value> {
    let values = fetch_all(data, sections, &Embedded).await;
    sections.iter().map(|s| slug(*s)).zip(values).collect()
}

/// Print several sections: one JSON document, or each section in turn.
pub async fn print_sections(data: &DataLayer, sections: &[Section], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let map = collect_json(data, sections).await;
            println!("{}", serde_json::to_string_pretty(&JsonOutput::new(map))?);
        }
        _ => {
            for text in fetch_all(data, sections, &Text(format)).await {
                println!("{}", text);
            }
        }
    }
    Ok(())
}

/// Print one section.
pub async fn print_one(ctx: &AppContext, section: Section) {
    println!("{}", fetch(&ctx.data, section, &Text(ctx.format)).await);
}

/// Dashboard overview, per-BU breakdown and revenue trend.
pub async fn dashboard(ctx: &AppContext) -> Result<()> {
    print_sections(
        &ctx.data,
        &[Section::Dashboard, Section::BuSummaries, Section::RevenueTrend],
        ctx.format,
    )
    .await
}

pub async fn customers(ctx: &AppContext, filters: &CustomerFilterArgs) -> Result<()> {
    let result = ctx
        .data
        .customers_with_health(&CustomerFilter::from(filters))
        .await;
    output::section::print(Section::Customers, &result, ctx.format);
    Ok(())
}

pub async fn recommendations(
    ctx: &AppContext,
    args: &RecommendationFilterArgs,
    urgent: bool,
) -> Result<()> {
    let filters = args.to_filters();
    let result = if urgent {
        urgent_matching(&ctx.data, &filters, args.limit.unwrap_or(URGENT_LIMIT)).await
    } else {
        ctx.data.recommendations(&filters).await.map(|mut recs| {
            if let Some(limit) = args.limit {
                recs.truncate(limit);
            }
            recs
        })
    };

    output::section::print(Section::Recommendations, &result, ctx.format);
    Ok(())
}

/// Urgent recommendations that pass `filters`, at most `limit` of them.
///
/// Filtering runs over the whole urgent list so a narrow filter still finds
/// matches ranked below the limit.
pub async fn urgent_matching(
    data: &DataLayer,
    filters: &RecommendationFilters,
    limit: usize,
) -> Result<Vec<Recommendation>> {
    let mut recs: Vec<Recommendation> = data
        .top_urgent_recommendations(usize::MAX)
        .await?
        .into_iter()
        .filter(|r| filters.matches(r))
        .collect();
    recs.truncate(limit);
    Ok(recs)
}
