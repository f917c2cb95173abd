//! Portfolio Intelligence CLI - cached business reports over spreadsheets,
//! the customer database and an AI provider

use std::time::Duration;

use clap::Parser;

mod cache;
mod cli;
mod config;
mod data;
mod error;
mod health;
mod models;
mod output;
mod sources;

use cli::{AppContext, Cli, Commands, GlobalOptions};
use data::Section;
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `--debug` turns on debug output.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "off" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    // Commands that never touch the data sources
    match &cli.command {
        Commands::Init => return cli::init::run(&opts).await,
        Commands::Completion { shell } => return cli::completions::run(*shell),
        _ => {}
    }

    let ctx = AppContext::new(&opts)?;
    match cli.command {
        Commands::Dashboard => cli::sections::dashboard(&ctx).await,
        Commands::DmTracker => {
            cli::sections::print_one(&ctx, Section::DmTracker).await;
            Ok(())
        }
        Commands::Customers { filters } => cli::sections::customers(&ctx, &filters).await,
        Commands::Alerts => {
            cli::sections::print_one(&ctx, Section::Alerts).await;
            Ok(())
        }
        Commands::Baseline => {
            cli::sections::print_one(&ctx, Section::Baseline).await;
            Ok(())
        }
        Commands::Recommendations { filters, urgent } => {
            cli::sections::recommendations(&ctx, &filters, urgent).await
        }
        Commands::Portfolio => {
            cli::sections::print_one(&ctx, Section::Portfolio).await;
            Ok(())
        }
        Commands::Briefing => {
            cli::sections::print_one(&ctx, Section::Briefing).await;
            Ok(())
        }
        Commands::Report => cli::report::report(&ctx).await,
        Commands::Warmup => cli::report::warmup(&ctx).await,
        Commands::Watch {
            section,
            interval,
            iterations,
            refresh,
        } => {
            let every = Duration::from_secs(interval);
            cli::report::watch(&ctx, section, every, iterations, refresh).await
        }
        Commands::Health => cli::health::run(&ctx).await,
        Commands::Seed { file } => cli::seed::run(&ctx, &file).await,
        Commands::Init | Commands::Completion { .. } => Ok(()),
    }
}
