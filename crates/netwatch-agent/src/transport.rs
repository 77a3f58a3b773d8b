// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::AgentConfig;
use crate::error::AgentError;
use async_trait::async_trait;
use netwatch_core::{MetricsBatch, MetricsBatchResponse, RequestMetric};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

const BATCH_ENDPOINT_PATH: &str = "/api/metrics/batch";
const HEALTH_ENDPOINT_PATH: &str = "/health";
const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Retry behavior for a delivery attempt window.
#[derive(Clone, Debug)]
pub enum RetryStrategy {
    /// Up to N attempts with no wait between them.
    Immediate(u32),
    /// Up to N attempts; the wait before retry R is `base * (2R - 1)`,
    /// i.e. with a 1s base the waits are 1s, 3s, 5s, ...
    LinearBackoff(u32, u64),
}

impl Default for RetryStrategy {
    fn default() -> Self {
        // 3 attempts, 1s base: waits of 1s then 3s before retries 1 and 2.
        RetryStrategy::LinearBackoff(3, 1000)
    }
}

impl RetryStrategy {
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryStrategy::Immediate(attempts) | RetryStrategy::LinearBackoff(attempts, _) => {
                (*attempts).max(1)
            }
        }
    }

    /// Wait to observe after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self {
            RetryStrategy::Immediate(_) => Duration::ZERO,
            RetryStrategy::LinearBackoff(_, base_ms) => {
                Duration::from_millis(base_ms * (2 * u64::from(attempt) - 1))
            }
        }
    }
}

/// Delivery seam between the buffer and the wire.
///
/// Ordinary network and server failures never surface as errors; the
/// outcome of one attempt window is a plain boolean and the batch is the
/// caller's to discard either way.
#[async_trait]
pub trait MetricsTransport: Send + Sync {
    /// Ship one batch within a bounded retry window. Returns `true` on 2xx.
    async fn send_batch(&self, metrics: &[RequestMetric], cancel: &CancellationToken) -> bool;

    /// Best-effort reachability probe of the collector.
    async fn is_healthy(&self) -> bool;
}

/// HTTP transport posting JSON batches to the collector.
pub struct HttpTransport {
    client: reqwest::Client,
    batch_url: String,
    health_url: String,
    retry_strategy: RetryStrategy,
    hostname: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        Self::with_retry_strategy(config, RetryStrategy::default())
    }

    pub fn with_retry_strategy(
        config: &AgentConfig,
        retry_strategy: RetryStrategy,
    ) -> Result<Self, AgentError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| AgentError::TransportInit(format!("invalid API key header: {e}")))?;
        headers.insert("X-Api-Key", api_key);

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("netwatch-agent/{AGENT_VERSION}"))
            .default_headers(headers)
            .build()
            .map_err(|e| AgentError::TransportInit(e.to_string()))?;

        let base = config.collector_endpoint.trim_end_matches('/');
        Ok(HttpTransport {
            client,
            batch_url: format!("{base}{BATCH_ENDPOINT_PATH}"),
            health_url: format!("{base}{HEALTH_ENDPOINT_PATH}"),
            retry_strategy,
            hostname: hostname::get()
                .ok()
                .and_then(|name| name.into_string().ok()),
        })
    }
}

#[async_trait]
impl MetricsTransport for HttpTransport {
    async fn send_batch(&self, metrics: &[RequestMetric], cancel: &CancellationToken) -> bool {
        if metrics.is_empty() {
            warn!("Attempted to send empty batch");
            return false;
        }

        let payload = MetricsBatch::new(metrics.to_vec(), AGENT_VERSION, self.hostname.clone());
        let max_attempts = self.retry_strategy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                "Sending batch with {} metrics (attempt {attempt}/{max_attempts})",
                metrics.len()
            );

            match self.client.post(&self.batch_url).json(&payload).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.json::<MetricsBatchResponse>().await {
                            Ok(ack) => debug!(
                                "Batch accepted: job {} ({} accepted, {} rejected)",
                                ack.job_id, ack.accepted, ack.rejected
                            ),
                            Err(e) => debug!("Batch accepted with unreadable response body: {e}"),
                        }
                        return true;
                    }
                    if status.is_client_error() {
                        // Retrying a rejected payload cannot help.
                        error!(
                            "Collector rejected batch ({status}), dropping {} metrics",
                            metrics.len()
                        );
                        return false;
                    }
                    warn!("Server error sending batch ({status}), attempt {attempt}/{max_attempts}");
                }
                Err(e) if e.is_timeout() => {
                    warn!("Timeout sending batch (attempt {attempt}/{max_attempts})");
                }
                Err(e) => {
                    warn!("Network error sending batch (attempt {attempt}/{max_attempts}): {e}");
                }
            }

            if attempt >= max_attempts {
                break;
            }

            let delay = self.retry_strategy.delay_after(attempt);
            debug!("Retrying in {}ms", delay.as_millis());
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel.cancelled() => {
                    warn!("Delivery cancelled while backing off, dropping {} metrics", metrics.len());
                    return false;
                }
            }
        }

        error!(
            "Failed to send batch after {max_attempts} attempts. Metrics lost: {}",
            metrics.len()
        );
        false
    }

    async fn is_healthy(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health check failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff_schedule() {
        let strategy = RetryStrategy::default();
        assert_eq!(strategy.max_attempts(), 3);
        assert_eq!(strategy.delay_after(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_after(2), Duration::from_secs(3));
    }

    #[test]
    fn test_immediate_strategy_never_waits() {
        let strategy = RetryStrategy::Immediate(3);
        assert_eq!(strategy.delay_after(1), Duration::ZERO);
        assert_eq!(strategy.delay_after(2), Duration::ZERO);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(RetryStrategy::Immediate(0).max_attempts(), 1);
    }

    #[test]
    fn test_endpoint_urls_join_cleanly() {
        let config = AgentConfig {
            api_key: "nw_key".to_string(),
            collector_endpoint: "http://localhost:5001/".to_string(),
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.batch_url, "http://localhost:5001/api/metrics/batch");
        assert_eq!(transport.health_url, "http://localhost:5001/health");
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let config = AgentConfig {
            api_key: "bad\nkey".to_string(),
            collector_endpoint: "http://localhost:5001".to_string(),
            ..Default::default()
        };
        assert!(HttpTransport::new(&config).is_err());
    }
}
