//! Customer list with health scoring

use std::sync::Arc;

use super::{DataLayer, keys};
use crate::cache::{TtlCategory, cache_key};
use crate::error::{Error, Result, guard};
use crate::models::{Customer, CustomerWithHealth, HealthScore};
use crate::sources::{CustomerFilter, store};

/// Reject records with an empty name or non-finite, negative amounts.
pub fn validate_customer(customer: &Customer) -> Result<()> {
    if customer.name.trim().is_empty() {
        return Err(Error::Validation("customer record has an empty name".to_string()));
    }
    for (field, value) in [("rr", customer.rr), ("nrr", customer.nrr), ("total", customer.total)] {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::Validation(format!(
                "{}: {} must be a non-negative number (got {})",
                customer.name, field, value
            )));
        }
    }
    Ok(())
}

/// Score one account from its renewal answers and revenue mix.
pub fn assess(customer: Customer) -> CustomerWithHealth {
    let mut score = HealthScore::Green;
    let mut factors = Vec::new();

    let at_risk = customer.subscriptions.iter().filter(|s| s.is_at_risk()).count();
    if at_risk > 0 {
        score = HealthScore::Red;
        factors.push(format!("{} subscription(s) not expected to renew", at_risk));
    }

    let uncertain = customer.subscriptions.iter().filter(|s| s.is_uncertain()).count();
    let confirmed = customer.subscriptions.iter().any(|s| s.is_confirmed());
    if uncertain > 0 && !confirmed {
        if score == HealthScore::Green {
            score = HealthScore::Yellow;
        }
        factors.push(format!("{} renewal(s) undecided", uncertain));
    }

    if customer.rr == 0.0 && customer.nrr > 0.0 {
        score = HealthScore::Red;
        factors.push("No recurring revenue; services only".to_string());
    }

    if factors.is_empty() {
        factors.push("No risk indicators detected".to_string());
    }

    CustomerWithHealth {
        customer,
        health_score: score,
        health_factors: factors,
    }
}

impl DataLayer {
    /// Customers matching `filter`, scored and sorted by total revenue.
    pub async fn customers_with_health(
        &self,
        filter: &CustomerFilter,
    ) -> Result<Vec<CustomerWithHealth>> {
        let store = Arc::clone(&self.sources.store);
        let key = cache_key(keys::CUSTOMERS, filter)?;
        let filter = filter.clone();

        self.cache
            .get(
                &key,
                move || {
                    guard(store::ADAPTER, async move {
                        let customers = store.find_customers(&filter).await?;
                        for customer in &customers {
                            validate_customer(customer)?;
                        }

                        let mut scored: Vec<CustomerWithHealth> =
                            customers.into_iter().map(assess).collect();
                        scored.sort_by(|a, b| b.customer.total.total_cmp(&a.customer.total));
                        Ok(scored)
                    })
                },
                self.options(TtlCategory::Customer),
            )
            .await
    }

    pub async fn all_customers_with_health(&self) -> Result<Vec<CustomerWithHealth>> {
        self.customers_with_health(&CustomerFilter::default()).await
    }
}
