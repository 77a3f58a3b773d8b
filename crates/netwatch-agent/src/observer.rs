// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::buffer::MetricsBuffer;
use crate::config::AgentConfig;
use netwatch_core::RequestMetric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Host-side gate between request handling and the buffer.
///
/// Sampling and ignored-path decisions happen here, before a record is ever
/// built — the buffer itself does no gating. [`record`](RequestObserver::record)
/// swallows and logs buffer errors so instrumentation can never fail the
/// request being measured.
#[derive(Clone)]
pub struct RequestObserver {
    config: Arc<AgentConfig>,
    buffer: MetricsBuffer,
}

impl RequestObserver {
    pub fn new(config: Arc<AgentConfig>, buffer: MetricsBuffer) -> Self {
        RequestObserver { config, buffer }
    }

    /// Decide up front whether a request at this path should be observed.
    pub fn should_capture(&self, path: &str) -> bool {
        !self.is_ignored(path) && self.should_sample()
    }

    /// Whether this header should be copied onto records (case-insensitive).
    pub fn captures_header(&self, name: &str) -> bool {
        self.config
            .captured_headers
            .iter()
            .any(|captured| captured.eq_ignore_ascii_case(name))
    }

    /// Hand a finished record to the buffer. Errors are logged, never
    /// propagated into the host's request path.
    pub fn record(&self, metric: RequestMetric) {
        let label = format!("{} {}", metric.method, metric.path);
        match self.buffer.add(metric) {
            Ok(pending) => debug!("Captured metric: {label} (pending: {pending})"),
            Err(e) => error!("Failed to buffer metric for {label}: {e}"),
        }
    }

    fn is_ignored(&self, path: &str) -> bool {
        self.config
            .ignore_paths
            .iter()
            .any(|prefix| starts_with_segments(path, prefix))
    }

    fn should_sample(&self) -> bool {
        if self.config.sample_rate >= 1.0 {
            return true;
        }
        if self.config.sample_rate <= 0.0 {
            return false;
        }
        rand::thread_rng().gen::<f64>() < self.config.sample_rate
    }
}

/// Case-insensitive path-segment prefix match: `/health` matches `/health`
/// and `/health/live` but not `/healthcheck`. Byte-wise so arbitrary
/// request paths cannot land on a char boundary.
fn starts_with_segments(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/').as_bytes();
    if prefix.is_empty() {
        return false;
    }
    let path = path.as_bytes();
    if path.len() < prefix.len() || !path[..prefix.len()].eq_ignore_ascii_case(prefix) {
        return false;
    }
    path.len() == prefix.len() || path[prefix.len()] == b'/'
}

/// Correlation id of the form `nw_<utc timestamp>_<random>`.
pub fn generate_trace_id() -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let random = Uuid::new_v4().simple().to_string();
    format!("nw_{timestamp}_{}", &random[..8])
}
