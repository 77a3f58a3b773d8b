// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One observed HTTP request outcome.
///
/// Records are immutable once handed to the buffer. The `trace_id` is a
/// correlation handle, not a deduplication key. Invariant:
/// `has_exception == exception_type.is_some()` — use [`RequestMetric::builder`]
/// to construct records so the flag stays consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetric {
    pub trace_id: String,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    pub status_code: u16,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
    pub has_exception: bool,
}

impl RequestMetric {
    pub fn builder(
        trace_id: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        status_code: u16,
        duration_ms: u64,
    ) -> RequestMetricBuilder {
        RequestMetricBuilder {
            metric: RequestMetric {
                trace_id: trace_id.into(),
                timestamp: Utc::now(),
                method: method.into(),
                path: path.into(),
                query_string: None,
                status_code,
                duration_ms,
                user_id: None,
                user_name: None,
                ip_address: None,
                user_agent: None,
                exception_type: None,
                exception_message: None,
                has_exception: false,
            },
        }
    }
}

/// Builder keeping the exception flag in sync with the exception descriptor.
#[derive(Debug)]
pub struct RequestMetricBuilder {
    metric: RequestMetric,
}

impl RequestMetricBuilder {
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.metric.timestamp = timestamp;
        self
    }

    pub fn query_string(mut self, query: impl Into<String>) -> Self {
        self.metric.query_string = Some(query.into());
        self
    }

    pub fn user(mut self, user_id: Option<String>, user_name: Option<String>) -> Self {
        self.metric.user_id = user_id;
        self.metric.user_name = user_name;
        self
    }

    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.metric.ip_address = ip_address;
        self.metric.user_agent = user_agent;
        self
    }

    /// Attach an exception descriptor; sets the exception flag.
    pub fn exception(mut self, type_name: impl Into<String>, message: impl Into<String>) -> Self {
        self.metric.exception_type = Some(type_name.into());
        self.metric.exception_message = Some(message.into());
        self.metric.has_exception = true;
        self
    }

    pub fn build(self) -> RequestMetric {
        self.metric
    }
}

/// Batch envelope shipped by the agent in a single delivery attempt.
///
/// Non-empty by contract; ownership transfers to the transport for the
/// duration of one attempt and the batch is discarded afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBatch {
    pub metrics: Vec<RequestMetric>,
    pub agent_version: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl MetricsBatch {
    pub fn new(
        metrics: Vec<RequestMetric>,
        agent_version: impl Into<String>,
        hostname: Option<String>,
    ) -> Self {
        MetricsBatch {
            metrics,
            agent_version: agent_version.into(),
            created_at: Utc::now(),
            hostname,
        }
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Collector acknowledgement for an accepted batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBatchResponse {
    pub job_id: Uuid,
    pub accepted: usize,
    pub rejected: usize,
    pub message: String,
}
