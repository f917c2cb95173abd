//! AI completion client
//!
//! Talks to an Anthropic-style messages endpoint. Requests are paced by a
//! local limiter so a burst of cache misses cannot exhaust the provider
//! quota; the provider's own 429 is still surfaced as a rate-limit error.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::{debug, warn};
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

use super::{AdapterHealth, HealthCheck};
use crate::config::AiSettings;
use crate::error::{Error, Result};

/// Adapter name used in errors and health output
pub const ADAPTER: &str = "ai";

/// Requests allowed per minute
const REQUESTS_PER_MINUTE: u32 = 50;

const API_VERSION: &str = "2023-06-01";

#[async_trait]
pub trait CompletionApi: HealthCheck {
    /// Model identifier reported alongside generated text
    fn model(&self) -> &str;

    /// Send one system + user prompt and return the text reply.
    ///
    /// Returns [`Error::NotConfigured`] without any network call when no
    /// credentials are available.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

pub struct AiClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AiClient {
    pub fn new(settings: &AiSettings) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        let quota = Quota::per_minute(NonZeroU32::new(REQUESTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CompletionApi for AiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::NotConfigured("AI provider".to_string()))?;

        self.limiter.until_ready().await;

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/v1/messages", self.base_url);
        debug!("POST {} (model {})", url, self.model);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let parsed = response.json::<MessagesResponse>().await.map_err(|e| {
                    Error::Validation(format!("Malformed AI response: {}", e))
                })?;

                let text: Vec<String> = parsed
                    .content
                    .into_iter()
                    .filter(|block| block.kind == "text")
                    .filter_map(|block| block.text)
                    .collect();
                if text.is_empty() {
                    return Err(Error::Validation(
                        "AI response contained no text".to_string(),
                    ));
                }
                Ok(text.join("\n"))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("AI provider rate limited; retry after {}s", retry_after);
                Err(Error::RateLimit(Duration::from_secs(retry_after)))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::adapter(
                ADAPTER,
                "credentials rejected by AI provider. Check ANTHROPIC_API_KEY.",
            )),
            _ => {
                let detail = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "no response body".to_string());
                Err(Error::adapter(
                    ADAPTER,
                    format!("unexpected status {}: {}", status, detail.trim()),
                ))
            }
        }
    }
}

#[async_trait]
impl HealthCheck for AiClient {
    async fn health(&self) -> AdapterHealth {
        if self.is_configured() {
            AdapterHealth::connected(ADAPTER)
        } else {
            AdapterHealth::degraded(ADAPTER, "ANTHROPIC_API_KEY not set; AI briefings disabled")
        }
    }
}
