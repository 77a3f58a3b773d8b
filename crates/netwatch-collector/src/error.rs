// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors that can occur while running the collector service.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Server socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Queue backend error: {0}")]
    Queue(#[from] redis::RedisError),

    #[error("Failed to serialize job payload: {0}")]
    Serialization(#[from] serde_json::Error),
}
