// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::metric::RequestMetric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope the collector enqueues onto the processing queue for each
/// accepted batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsProcessingJob {
    pub job_id: Uuid,
    pub project_id: Uuid,
    pub metrics: Vec<RequestMetric>,
    pub received_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
}

impl MetricsProcessingJob {
    pub fn new(
        metrics: Vec<RequestMetric>,
        source: Option<String>,
        agent_version: Option<String>,
    ) -> Self {
        MetricsProcessingJob {
            job_id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            metrics,
            received_at: Utc::now(),
            source,
            agent_version,
        }
    }
}

/// Point-in-time view of a processing queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub queue_name: String,
    pub pending_count: u64,
    pub processed_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_enqueued_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::RequestMetric;

    #[test]
    fn test_job_gets_fresh_id_and_nil_project() {
        let metric = RequestMetric::builder("nw_a", "GET", "/", 200, 1).build();
        let a = MetricsProcessingJob::new(vec![metric.clone()], None, None);
        let b = MetricsProcessingJob::new(vec![metric], Some("web-1".into()), Some("0.1.0".into()));
        assert_ne!(a.job_id, b.job_id);
        assert!(a.project_id.is_nil());
        assert_eq!(b.source.as_deref(), Some("web-1"));
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let job = MetricsProcessingJob::new(Vec::new(), Some("web-1".into()), None);
        let json = serde_json::to_value(&job).unwrap();
        assert!(json.get("jobId").is_some());
        assert!(json.get("receivedAt").is_some());
        assert!(json.get("agentVersion").is_none());
    }
}
