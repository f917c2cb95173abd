//! Seed command: load customer records into the database

use std::path::Path;

use colored::Colorize;
use log::{debug, info};
use serde::Serialize;

use crate::cli::{AppContext, OutputFormat};
use crate::data::customers::validate_customer;
use crate::data::{DataLayer, keys};
use crate::error::{Error, Result};
use crate::models::Customer;
use crate::output::json::format_json;

/// What a seed run changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedSummary {
    pub customers: usize,
    pub subscriptions: usize,
    pub invalidated: usize,
}

/// Parse and validate a JSON array of customers.
pub fn parse_customers(json: &str) -> Result<Vec<Customer>> {
    let customers: Vec<Customer> = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("seed file is not a customer array: {}", e)))?;

    for customer in &customers {
        validate_customer(customer)?;
        if customer.bu.trim().is_empty() {
            return Err(Error::Validation(format!(
                "{}: bu must not be empty",
                customer.name
            )));
        }
    }
    Ok(customers)
}

/// Upsert every customer, then drop cached views derived from them.
pub async fn seed_into(data: &DataLayer, customers: &[Customer]) -> Result<SeedSummary> {
    let store = &data.sources().store;
    for customer in customers {
        let id = store.upsert_customer(customer).await?;
        debug!("Upserted {} ({}) as #{}", customer.name, customer.bu, id);
    }

    let cache = data.cache();
    let invalidated = cache.invalidate_matching(&format!("{}:*", keys::CUSTOMERS))
        + usize::from(cache.invalidate(keys::ALERTS));

    Ok(SeedSummary {
        customers: customers.len(),
        subscriptions: customers.iter().map(|c| c.subscriptions.len()).sum(),
        invalidated,
    })
}

pub async fn run(ctx: &AppContext, file: &Path) -> Result<()> {
    let contents = tokio::fs::read_to_string(file).await.map_err(|e| {
        Error::Io(format!("cannot read {}: {}", file.display(), e))
    })?;
    let customers = parse_customers(&contents)?;
    let summary = seed_into(&ctx.data, &customers).await?;
    info!("Seeded {} customers from {}", summary.customers, file.display());

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&summary)?),
        _ => println!(
            "{} Seeded {} customers ({} subscriptions) into {}",
            "✓".green(),
            summary.customers,
            summary.subscriptions,
            ctx.config.database_path().display()
        ),
    }
    Ok(())
}
