//! Public client surface + builder.
//! Internals are split into `constants` (UA + defaults) and `retry` (backoff policy).

mod constants;
pub mod retry;

pub use retry::{Backoff, RetryConfig};

use crate::core::{InsiderError, PipelineConfig};
use constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use url::Url;

/// Thin wrapper that holds a configured HTTP client, the screener URL and a retry policy.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct InsiderClient {
    http: Client,
    base_url: Url,
    retry: RetryConfig,
}

impl Default for InsiderClient {
    fn default() -> Self {
        Self::builder().build().expect("default client")
    }
}

impl InsiderClient {
    /// Create a new builder.
    pub fn builder() -> InsiderClientBuilder {
        InsiderClientBuilder::default()
    }

    /// Build a client from pipeline configuration (base URL and request timeout).
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, InsiderError> {
        Self::builder()
            .base_url(cfg.base_url.clone())
            .timeout(cfg.request_timeout)
            .build()
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// The screener endpoint windows are fetched from.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The retry policy applied to every screener request.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Send a request, retrying on retryable statuses and transport errors.
    ///
    /// The last response is returned as-is, so callers still check its status.
    pub(crate) async fn send_with_retry(&self, req: RequestBuilder) -> Result<Response, InsiderError> {
        let mut attempt = 0u32;
        loop {
            let this = req
                .try_clone()
                .ok_or_else(|| InsiderError::Data("request body is not cloneable".into()))?;
            let can_retry = self.retry.enabled && attempt < self.retry.max_retries;

            match this.send().await {
                Ok(resp) if can_retry && self.retry.should_retry_status(resp.status().as_u16()) => {
                    tracing::debug!(status = resp.status().as_u16(), attempt, "retrying on status");
                }
                Ok(resp) => return Ok(resp),
                Err(e) if can_retry && self.retry.should_retry_error(&e) => {
                    tracing::debug!(error = %e, attempt, "retrying on transport error");
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(self.retry.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct InsiderClientBuilder {
    user_agent: Option<String>,
    base_url: Option<Url>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: Option<RetryConfig>,
}

impl InsiderClientBuilder {
    /// Override the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Override the screener URL (e.g., `http://openinsider.com/screener`).
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set a per-request timeout (overall). Default: 30s.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Replace the default retry policy.
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    pub fn build(self) -> Result<InsiderClient, InsiderError> {
        let base_url = match self.base_url {
            Some(u) => u,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        let mut httpb = reqwest::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT))
            .timeout(
                self.timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            );

        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }

        Ok(InsiderClient {
            http: httpb.build()?,
            base_url,
            retry: self.retry.unwrap_or_default(),
        })
    }
}
