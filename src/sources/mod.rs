//! External collaborators behind the data adapters
//!
//! Each collaborator is reached through a trait so adapters can be tested
//! against [`mock`] implementations, and each reports its own health.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub mod ai;
#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod mock;
pub mod script;
pub mod store;

pub use ai::{AiClient, CompletionApi};
pub use script::{Extraction, ScriptRunner};
pub use store::{CustomerFilter, CustomerStore, SqliteStore};

/// Self-reported state of a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterStatus {
    Connected,
    /// Usable with reduced function (e.g. AI without credentials)
    Degraded,
    Failed,
}

impl fmt::Display for AdapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AdapterStatus::Connected => "connected",
            AdapterStatus::Degraded => "degraded",
            AdapterStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Health line for one collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub status: AdapterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AdapterHealth {
    pub fn connected(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: AdapterStatus::Connected,
            detail: None,
        }
    }

    pub fn degraded(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: AdapterStatus::Degraded,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: AdapterStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}

/// Collaborators report their own status; health never goes through the cache.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health(&self) -> AdapterHealth;
}

/// The set of collaborators shared by every adapter.
#[derive(Clone)]
pub struct Sources {
    pub scripts: Arc<dyn Extraction>,
    pub store: Arc<dyn CustomerStore>,
    pub ai: Arc<dyn CompletionApi>,
}

impl Sources {
    /// Check every collaborator concurrently.
    pub async fn health(&self) -> Vec<AdapterHealth> {
        let (scripts, store, ai) =
            tokio::join!(self.scripts.health(), self.store.health(), self.ai.health());
        vec![scripts, store, ai]
    }
}
