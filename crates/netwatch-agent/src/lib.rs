// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-process request telemetry agent.
//!
//! Observes HTTP request completions inside a host application, accumulates
//! them in a concurrent buffer, and periodically ships them in batches to a
//! NetWatch collector over an unreliable link. Delivery is best-effort:
//! bounded retries, no persistence, and never any blocking of the host's
//! request path.
//!
//! Typical wiring:
//!
//! ```no_run
//! use netwatch_agent::buffer::MetricsBuffer;
//! use netwatch_agent::config::AgentConfig;
//! use netwatch_agent::observer::RequestObserver;
//! use netwatch_agent::transport::HttpTransport;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), netwatch_agent::error::AgentError> {
//! let config = Arc::new(AgentConfig {
//!     api_key: "nw_example_key".to_string(),
//!     collector_endpoint: "http://localhost:5001".to_string(),
//!     ..Default::default()
//! });
//! let transport = Arc::new(HttpTransport::new(&config)?);
//! let buffer = MetricsBuffer::start(transport, &config)?;
//! let observer = RequestObserver::new(config, buffer.clone());
//! // ... hand `observer` to the request pipeline ...
//! buffer.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod buffer;
pub mod config;
pub mod error;
pub mod observer;
pub mod transport;

pub use buffer::{FlushOutcome, MetricsBuffer};
pub use config::AgentConfig;
pub use error::AgentError;
pub use observer::{generate_trace_id, RequestObserver};
pub use transport::{HttpTransport, MetricsTransport, RetryStrategy};
