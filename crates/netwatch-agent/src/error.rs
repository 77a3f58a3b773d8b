// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors surfaced by the agent to its host application.
///
/// Ordinary delivery failures are not errors — the transport reports those
/// as a boolean and the batch is dropped. Only configuration and lifecycle
/// misuse surface here.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP transport: {0}")]
    TransportInit(String),

    #[error("Buffer has been shut down")]
    BufferClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AgentError::InvalidConfig("missing API key".to_string());
        assert_eq!(error.to_string(), "Invalid configuration: missing API key");
    }

    #[test]
    fn test_error_debug() {
        let error = AgentError::BufferClosed;
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("BufferClosed"));
    }
}
