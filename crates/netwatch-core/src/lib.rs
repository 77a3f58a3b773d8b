// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared data model for the NetWatch request telemetry pipeline.
//!
//! These are the wire types exchanged between the in-process agent and the
//! collector: individual request metrics, the batch envelope the agent
//! ships, the collector's acknowledgement, and the processing job the
//! collector enqueues downstream. Pure data, no I/O.

pub mod job;
pub mod metric;

pub use job::{MetricsProcessingJob, QueueStats};
pub use metric::{MetricsBatch, MetricsBatchResponse, RequestMetric, RequestMetricBuilder};
