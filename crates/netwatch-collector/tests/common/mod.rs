// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory queue double for collector handler tests

use async_trait::async_trait;
use chrono::Utc;
use netwatch_collector::error::CollectorError;
use netwatch_collector::queue::QueueService;
use netwatch_core::{MetricsProcessingJob, QueueStats, RequestMetric};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Queue double holding enqueued jobs in memory.
pub struct InMemoryQueueService {
    pub jobs: Mutex<Vec<MetricsProcessingJob>>,
    healthy: AtomicBool,
    next_id: AtomicU64,
}

impl InMemoryQueueService {
    pub fn new() -> Arc<Self> {
        Arc::new(InMemoryQueueService {
            jobs: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
        })
    }

    /// A queue whose backend is down: enqueues fail and health is false.
    #[allow(dead_code)]
    pub fn unavailable() -> Arc<Self> {
        let queue = Self::new();
        queue.healthy.store(false, Ordering::SeqCst);
        queue
    }

    #[allow(dead_code)]
    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl QueueService for InMemoryQueueService {
    async fn enqueue(&self, job: &MetricsProcessingJob) -> Result<String, CollectorError> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(CollectorError::Queue(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        self.jobs.lock().unwrap().push(job.clone());
        let seq = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-0", seq))
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn stats(&self) -> Result<QueueStats, CollectorError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(QueueStats {
            queue_name: "metrics:pending".to_string(),
            pending_count: jobs.len() as u64,
            processed_count: 0,
            last_enqueued_at: jobs.last().map(|_| Utc::now()),
        })
    }
}

#[allow(dead_code)]
pub fn sample_metric(n: usize) -> RequestMetric {
    RequestMetric::builder(format!("nw_test_{n}"), "GET", "/api/orders", 200, 12).build()
}
