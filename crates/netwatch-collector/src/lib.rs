// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ingestion endpoint for NetWatch metric batches.
//!
//! Accepts batch POSTs from the in-process agent, validates them, enqueues
//! a processing job onto a Redis stream, and acknowledges with 202 plus a
//! job identifier. The heavy lifting happens downstream of the queue.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod error;
pub mod http_utils;
pub mod queue;
pub mod server;

pub use config::CollectorConfig;
pub use error::CollectorError;
pub use queue::{QueueService, RedisQueueService};
pub use server::CollectorServer;
