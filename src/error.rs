//! Error types for portfolio-intel
//!
//! Every fallible operation returns [`Result`]. Errors are `Clone` so one
//! settled outcome can be handed to every caller that joined the same cache
//! computation.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;

/// Result type alias for portfolio-intel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// External data did not have the expected shape
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A wrapped collaborator (subprocess, database, HTTP) failed
    #[error("{adapter}: {message}")]
    Adapter { adapter: String, message: String },

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    /// An optional collaborator has no credentials; callers degrade instead of failing
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("Timed out after {after:?} waiting for '{key}'")]
    Timeout { key: String, after: Duration },

    /// Unexpected internal failure inside the cache; indicates a bug
    #[error("Internal cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl Error {
    /// Build an adapter failure for the named collaborator.
    pub fn adapter(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Adapter {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Adapter { .. } => "adapter",
            Error::RateLimit(_) => "rate_limit",
            Error::NotConfigured(_) => "not_configured",
            Error::Timeout { .. } => "timeout",
            Error::Cache(_) => "cache",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Dialoguer(_) => "prompt",
            Error::Other(_) => "other",
        }
    }

    /// Retry hint carried by rate-limit failures.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimit(after) => Some(*after),
            _ => None,
        }
    }

    /// Attribute untyped failures to an adapter, leaving domain kinds alone.
    fn attribute_to(self, adapter: &str) -> Self {
        match self {
            Error::Io(message) | Error::Json(message) | Error::Other(message) => {
                Error::adapter(adapter, message)
            }
            other => other,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::adapter("store", err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::adapter("ai", "Request timed out")
        } else if err.is_connect() {
            Error::adapter("ai", "Failed to connect to AI provider")
        } else {
            Error::adapter("ai", err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}. Run `pintel init` to create one.")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Await a collaborator call, converting panics and untyped errors into
/// adapter failures tagged with `adapter`.
///
/// Every data adapter composes its producer with this so that no raw panic
/// reaches the cache and every failure carries the adapter's name.
pub async fn guard<T, Fut>(adapter: &str, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            let err = err.attribute_to(adapter);
            match err {
                Error::NotConfigured(_) | Error::RateLimit(_) => log::warn!("[{}] {}", adapter, err),
                _ => log::error!("[{}] {}", adapter, err),
            }
            Err(err)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            log::error!("[{}] unexpected failure: {}", adapter, message);
            Err(Error::adapter(
                adapter,
                format!("unexpected failure: {}", message),
            ))
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
