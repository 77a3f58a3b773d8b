// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::CollectorError;
use std::env;

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";
const DEFAULT_QUEUE_NAME: &str = "metrics:pending";
const DEFAULT_MAX_BATCH_RECORDS: usize = 1000;
const DEFAULT_MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024; // 10MB in Bytes

/// Configuration for the collector service.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Connection URL of the Redis queue backend.
    pub redis_url: String,
    /// Stream the processing jobs are enqueued onto.
    pub queue_name: String,
    /// Batches with more records than this are rejected with a 4xx.
    pub max_batch_records: usize,
    /// Request bodies larger than this are rejected before parsing.
    pub max_content_length: usize,
    /// Log level (e.g. trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            max_batch_records: DEFAULT_MAX_BATCH_RECORDS,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            log_level: "info".to_string(),
        }
    }
}

impl CollectorConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, CollectorError> {
        let port = env::var("NETWATCH_COLLECTOR_PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let redis_url =
            env::var("NETWATCH_REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        let queue_name =
            env::var("NETWATCH_QUEUE_NAME").unwrap_or_else(|_| DEFAULT_QUEUE_NAME.to_string());
        let max_batch_records = env::var("NETWATCH_MAX_BATCH_RECORDS")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_BATCH_RECORDS);
        let log_level = env::var("NETWATCH_COLLECTOR_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            port,
            redis_url,
            queue_name,
            max_batch_records,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), CollectorError> {
        if self.port == 0 {
            return Err(CollectorError::InvalidConfig(
                "Collector port must be greater than 0".to_string(),
            ));
        }

        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            return Err(CollectorError::InvalidConfig(format!(
                "Redis URL '{}' must be a redis(s) URL",
                self.redis_url
            )));
        }

        if self.queue_name.trim().is_empty() {
            return Err(CollectorError::InvalidConfig(
                "Queue name cannot be empty".to_string(),
            ));
        }

        if self.max_batch_records == 0 {
            return Err(CollectorError::InvalidConfig(
                "Max batch records must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(CollectorError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}
