// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::transport::MetricsTransport;
use netwatch_core::RequestMetric;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Result of one flush request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// A batch of this many records was delivered.
    Sent(usize),
    /// A batch of this many records was drained but delivery failed; the
    /// records are gone (best-effort contract).
    Dropped(usize),
    /// Nothing pending, or the buffer is already shut down.
    Empty,
    /// Another flush holds the single-flight token; no work was done.
    InFlight,
}

/// Concurrent-safe accumulator of request metrics.
///
/// Producers call [`add`](MetricsBuffer::add) from any number of tasks;
/// draining happens on one flush at a time, triggered by the periodic timer
/// started at construction, by the pending count reaching
/// `max_buffer_size`, by an explicit [`flush`](MetricsBuffer::flush), or by
/// [`shutdown`](MetricsBuffer::shutdown). `add` never performs network I/O.
///
/// Cheap to clone; clones share the same queue and flush state.
#[derive(Clone)]
pub struct MetricsBuffer {
    inner: Arc<BufferInner>,
}

struct BufferInner {
    queue: Mutex<VecDeque<RequestMetric>>,
    pending: AtomicUsize,
    max_buffer_size: usize,
    // Single-flight token: one permit, never replenished beyond one.
    flush_gate: Semaphore,
    transport: Arc<dyn MetricsTransport>,
    closed: AtomicBool,
    cancel: CancellationToken,
}

#[allow(clippy::expect_used)]
impl MetricsBuffer {
    /// Validate the configuration, create the buffer, and start the
    /// periodic flush task. Must be called from within a tokio runtime.
    pub fn start(
        transport: Arc<dyn MetricsTransport>,
        config: &AgentConfig,
    ) -> Result<MetricsBuffer, AgentError> {
        config.validate()?;

        let buffer = MetricsBuffer {
            inner: Arc::new(BufferInner {
                queue: Mutex::new(VecDeque::new()),
                pending: AtomicUsize::new(0),
                max_buffer_size: config.max_buffer_size,
                flush_gate: Semaphore::new(1),
                transport,
                closed: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        };

        info!(
            "Metrics buffer initialized with flush_interval={}s, max_buffer_size={}",
            config.flush_interval_secs, config.max_buffer_size
        );

        let timer = buffer.clone();
        let period = config.flush_interval();
        tokio::spawn(async move {
            let mut flush_interval = interval(period);
            flush_interval.tick().await; // discard first tick, which is instantaneous
            loop {
                tokio::select! {
                    _ = flush_interval.tick() => {
                        timer.flush().await;
                    }
                    () = timer.inner.cancel.cancelled() => break,
                }
            }
        });

        Ok(buffer)
    }

    /// Append one record to the pending queue.
    ///
    /// Returns the post-increment pending count. If the count reaches
    /// `max_buffer_size` a flush is spawned in the background; the caller
    /// returns immediately either way.
    pub fn add(&self, metric: RequestMetric) -> Result<usize, AgentError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(AgentError::BufferClosed);
        }

        {
            let mut queue = self.inner.queue.lock().expect("lock poisoned");
            queue.push_back(metric);
        }
        let pending = self.inner.pending.fetch_add(1, Ordering::AcqRel) + 1;
        trace!("Metric added to buffer, queue size: {pending}");

        if pending >= self.inner.max_buffer_size {
            debug!(
                "Buffer reached max size ({}), triggering flush",
                self.inner.max_buffer_size
            );
            let buffer = self.clone();
            tokio::spawn(async move {
                buffer.flush().await;
            });
        }

        Ok(pending)
    }

    /// Drain and deliver pending records now.
    ///
    /// Single-flight: if another flush is running this returns
    /// [`FlushOutcome::InFlight`] immediately — flush requests are dropped,
    /// never queued. An empty queue is a cheap no-op.
    pub async fn flush(&self) -> FlushOutcome {
        if self.inner.closed.load(Ordering::Acquire) {
            return FlushOutcome::Empty;
        }

        let Ok(_permit) = self.inner.flush_gate.try_acquire() else {
            trace!("Flush already in progress, skipping this flush call");
            return FlushOutcome::InFlight;
        };

        self.drain_and_send(&self.inner.cancel).await
    }

    /// Stop accepting records, cancel the periodic timer and any in-flight
    /// delivery waits, then drain the remainder in one final best-effort
    /// flush bounded by the transport's retry cap.
    pub async fn shutdown(&self) -> FlushOutcome {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return FlushOutcome::Empty;
        }

        info!("Shutting down metrics buffer, flushing remaining metrics");
        self.inner.cancel.cancel();

        // Wait for the token here rather than try-acquire: a cancelled
        // in-flight flush releases it promptly, and the final drain must
        // actually run.
        match self.inner.flush_gate.acquire().await {
            Ok(_permit) => {
                let shutdown_cancel = CancellationToken::new();
                self.drain_and_send(&shutdown_cancel).await
            }
            Err(_) => FlushOutcome::Empty,
        }
    }

    /// Number of records currently pending.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Whether [`shutdown`](MetricsBuffer::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    async fn drain_and_send(&self, cancel: &CancellationToken) -> FlushOutcome {
        let batch = self.drain_batch();
        if batch.is_empty() {
            trace!("Buffer is empty, nothing to flush");
            return FlushOutcome::Empty;
        }

        debug!("Flushing {} metrics to collector", batch.len());
        if self.inner.transport.send_batch(&batch, cancel).await {
            debug!("Successfully flushed {} metrics", batch.len());
            FlushOutcome::Sent(batch.len())
        } else {
            warn!("Failed to flush {} metrics, batch dropped", batch.len());
            FlushOutcome::Dropped(batch.len())
        }
    }

    /// Atomically remove up to `max_buffer_size` records, preserving
    /// insertion order. Anything beyond the cap stays queued for the next
    /// trigger.
    fn drain_batch(&self) -> Vec<RequestMetric> {
        let batch: Vec<RequestMetric> = {
            let mut queue = self.inner.queue.lock().expect("lock poisoned");
            let take = queue.len().min(self.inner.max_buffer_size);
            queue.drain(..take).collect()
        };
        if !batch.is_empty() {
            self.inner.pending.fetch_sub(batch.len(), Ordering::AcqRel);
        }
        batch
    }
}
