// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock transport implementations for buffer tests

use async_trait::async_trait;
use netwatch_agent::transport::MetricsTransport;
use netwatch_core::RequestMetric;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Transport double recording every delivery attempt.
pub struct MockTransport {
    pub sends: AtomicUsize,
    pub batch_sizes: Mutex<Vec<usize>>,
    pub delivered: Mutex<Vec<RequestMetric>>,
    pub dropped: AtomicUsize,
    succeed: AtomicBool,
    delay: Duration,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(MockTransport {
            sends: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
            dropped: AtomicUsize::new(0),
            succeed: AtomicBool::new(true),
            delay: Duration::ZERO,
        })
    }

    /// A transport whose every delivery fails after the configured delay.
    #[allow(dead_code)]
    pub fn failing() -> Arc<Self> {
        let transport = Self::new();
        transport.succeed.store(false, Ordering::SeqCst);
        transport
    }

    /// A transport that stalls each delivery, as an unreachable collector
    /// would.
    #[allow(dead_code)]
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(MockTransport {
            sends: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
            dropped: AtomicUsize::new(0),
            succeed: AtomicBool::new(true),
            delay,
        })
    }

    #[allow(dead_code)]
    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsTransport for MockTransport {
    async fn send_batch(&self, metrics: &[RequestMetric], cancel: &CancellationToken) -> bool {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(metrics.len());

        if !self.delay.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(self.delay) => {}
                () = cancel.cancelled() => {
                    self.dropped.fetch_add(metrics.len(), Ordering::SeqCst);
                    return false;
                }
            }
        }

        if self.succeed.load(Ordering::SeqCst) {
            self.delivered.lock().unwrap().extend_from_slice(metrics);
            true
        } else {
            self.dropped.fetch_add(metrics.len(), Ordering::SeqCst);
            false
        }
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[allow(dead_code)]
pub fn sample_metric(n: usize) -> RequestMetric {
    RequestMetric::builder(format!("nw_test_{n}"), "GET", "/api/orders", 200, 12).build()
}
