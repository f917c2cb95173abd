//! Health command implementation

use crate::cli::AppContext;
use crate::error::Result;
use crate::health;
use crate::output::Formattable;

/// Print collaborator status, cache statistics and environment.
///
/// Always succeeds; a failed collaborator is part of the report.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let report = health::collect(ctx).await;
    println!("{}", report.format(ctx.format)?);
    Ok(())
}
