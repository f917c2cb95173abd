//! In-memory collaborators for testing
//!
//! One [`MockSources`] value stands in for the extraction scripts, the
//! customer store and the AI provider at once, counting every call so tests
//! can assert how often the cache let a request through.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::script::{DM_SCRIPT, FINANCIALS_SCRIPT};
use super::{
    AdapterHealth, CompletionApi, CustomerFilter, CustomerStore, Extraction, HealthCheck, Sources,
};
use crate::error::{Error, Result};
use crate::models::Customer;

/// Tracks collaborator call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub financials: usize,
    pub dm_tracker: usize,
    pub find_customers: usize,
    pub upsert_customer: usize,
    pub complete: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.financials + self.dm_tracker + self.find_customers + self.upsert_customer + self.complete
    }
}

/// Mock collaborators.
///
/// # Example
/// ```ignore
/// let mock = MockSources::new().with_financials(financials_json()).await;
/// let data = DataLayer::new(Cache::default(), TtlPolicy::default(), mock.sources());
/// ```
#[derive(Clone)]
pub struct MockSources {
    financials: Arc<Mutex<Option<Result<Value>>>>,
    dm: Arc<Mutex<Option<Result<Value>>>>,
    customers: Arc<Mutex<Vec<Customer>>>,
    store_error: Arc<Mutex<Option<Error>>>,
    reply: Arc<Mutex<Option<Result<String>>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<CallCounts>>,
}

impl Default for MockSources {
    fn default() -> Self {
        Self {
            financials: Arc::new(Mutex::new(None)),
            dm: Arc::new(Mutex::new(None)),
            customers: Arc::new(Mutex::new(Vec::new())),
            store_error: Arc::new(Mutex::new(None)),
            reply: Arc::new(Mutex::new(None)),
            delay: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(CallCounts::default())),
        }
    }
}

impl MockSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output of the financials script.
    pub async fn with_financials(self, value: Value) -> Self {
        self.set_financials(Ok(value)).await;
        self
    }

    /// Output of the DM% script.
    pub async fn with_dm(self, value: Value) -> Self {
        self.set_dm(Ok(value)).await;
        self
    }

    pub async fn with_customers(self, customers: Vec<Customer>) -> Self {
        *self.customers.lock().await = customers;
        self
    }

    /// Reply from the AI provider. Without one the provider is unconfigured.
    pub async fn with_reply(self, reply: Result<String>) -> Self {
        *self.reply.lock().await = Some(reply);
        self
    }

    /// Simulated latency for every call.
    pub async fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().await = Some(delay);
        self
    }

    pub async fn set_financials(&self, outcome: Result<Value>) {
        *self.financials.lock().await = Some(outcome);
    }

    pub async fn set_dm(&self, outcome: Result<Value>) {
        *self.dm.lock().await = Some(outcome);
    }

    /// Make the store fail until cleared with `None`.
    pub async fn set_store_error(&self, error: Option<Error>) {
        *self.store_error.lock().await = error;
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Prompts sent to the AI provider, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    /// Wire this mock in as every collaborator.
    pub fn sources(&self) -> Sources {
        Sources {
            scripts: Arc::new(self.clone()),
            store: Arc::new(self.clone()),
            ai: Arc::new(self.clone()),
        }
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn missing(script: &str) -> Error {
    Error::adapter(
        "excel",
        format!("extraction script not found at scripts/{}", script),
    )
}

#[async_trait]
impl Extraction for MockSources {
    async fn extract(&self, script: &str, _args: &[&str]) -> Result<Value> {
        let slot = match script {
            FINANCIALS_SCRIPT => {
                self.call_count.lock().await.financials += 1;
                &self.financials
            }
            DM_SCRIPT => {
                self.call_count.lock().await.dm_tracker += 1;
                &self.dm
            }
            other => return Err(missing(other)),
        };
        self.pause().await;

        slot.lock().await.clone().unwrap_or_else(|| Err(missing(script)))
    }
}

#[async_trait]
impl CustomerStore for MockSources {
    async fn find_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        self.call_count.lock().await.find_customers += 1;
        self.pause().await;

        if let Some(err) = self.store_error.lock().await.clone() {
            return Err(err);
        }

        let mut customers: Vec<Customer> = self
            .customers
            .lock()
            .await
            .iter()
            .filter(|c| filter.bu.as_ref().is_none_or(|bu| *bu == c.bu))
            .filter(|c| filter.min_total.is_none_or(|min| c.total >= min))
            .cloned()
            .collect();
        customers.sort_by(|a, b| b.total.total_cmp(&a.total));
        Ok(customers)
    }

    async fn upsert_customer(&self, customer: &Customer) -> Result<i64> {
        self.call_count.lock().await.upsert_customer += 1;
        let mut customers = self.customers.lock().await;
        customers.retain(|c| !(c.name == customer.name && c.bu == customer.bu));
        customers.push(customer.clone());
        Ok(customers.len() as i64)
    }
}

#[async_trait]
impl CompletionApi for MockSources {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        self.call_count.lock().await.complete += 1;
        self.prompts.lock().await.push(prompt.to_string());
        self.pause().await;

        self.reply
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| Err(Error::NotConfigured("AI provider".to_string())))
    }
}

#[async_trait]
impl HealthCheck for MockSources {
    async fn health(&self) -> AdapterHealth {
        AdapterHealth::connected("mock")
    }
}
