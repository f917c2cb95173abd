//! JSON output formatting

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    /// RFC 3339 time the output was produced
    pub timestamp: String,

    /// CLI version
    pub version: String,
}

impl Metadata {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata::now(),
        }
    }
}

/// A failed section in JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            retry_after_secs: err.retry_after().map(|d| d.as_secs()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub error: ErrorBody,
    pub meta: Metadata,
}

/// Format data as pretty-printed JSON
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

/// Format a failure as `{ "error": {...}, "meta": {...} }`.
pub fn format_json_error(err: &Error) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonError {
        error: ErrorBody::from(err),
        meta: Metadata::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Serialize, Clone)]
    struct Item {
        bu: String,
    }

    #[test]
    fn test_json_output_new() {
        let output = JsonOutput::new(vec!["Kandy", "STL"]);

        assert_eq!(output.data, vec!["Kandy", "STL"]);
        assert_eq!(output.meta.version, env!("CARGO_PKG_VERSION"));
        assert!(!output.meta.timestamp.is_empty());
    }

    #[test]
    fn test_format_json_wraps_data() {
        let items = vec![Item {
            bu: "Cloudsense".to_string(),
        }];
        let result = format_json(&items).unwrap();

        assert!(result.contains("\"data\""));
        assert!(result.contains("\"meta\""));
        assert!(result.contains("\"bu\": \"Cloudsense\""));
        assert!(result.contains("\"version\""));
    }

    #[test]
    fn test_format_json_error() {
        let err = Error::adapter("excel", "Python 3 not found");
        let parsed: serde_json::Value =
            serde_json::from_str(&format_json_error(&err).unwrap()).unwrap();

        assert_eq!(parsed["error"]["kind"], "adapter");
        assert_eq!(parsed["error"]["message"], "excel: Python 3 not found");
        assert!(parsed["error"].get("retry_after_secs").is_none());
        assert!(parsed.get("data").is_none());
    }

    #[test]
    fn test_rate_limit_error_carries_retry_hint() {
        let body = ErrorBody::from(&Error::RateLimit(Duration::from_secs(12)));
        assert_eq!(body.kind, "rate_limit");
        assert_eq!(body.retry_after_secs, Some(12));
    }
}
