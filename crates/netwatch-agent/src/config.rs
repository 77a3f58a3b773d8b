// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::AgentError;
use std::env;
use std::time::Duration;

const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5;
const DEFAULT_MAX_BUFFER_SIZE: usize = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Agent configuration, validated once at construction and immutable
/// afterwards.
///
/// `max_buffer_size` bounds both the size-trigger threshold and the number
/// of records drained per flush. The two are intentionally one knob:
/// decoupling them changes flush cadence semantics.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// API key sent to the collector in the `X-Api-Key` header.
    pub api_key: String,
    /// Base URL of the collector (e.g. `http://localhost:5001`).
    pub collector_endpoint: String,
    /// How often the periodic flush fires, in seconds.
    pub flush_interval_secs: u64,
    /// Size trigger threshold and per-flush drain cap, in records.
    pub max_buffer_size: usize,
    /// Fraction of requests captured, 0.0–1.0.
    pub sample_rate: f64,
    /// Path prefixes excluded from capture (case-insensitive match).
    pub ignore_paths: Vec<String>,
    /// Request header names the observer copies onto records.
    pub captured_headers: Vec<String>,
    /// Per-request timeout for collector calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            collector_endpoint: String::new(),
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            sample_rate: 1.0,
            ignore_paths: vec![
                "/health".to_string(),
                "/healthz".to_string(),
                "/ready".to_string(),
                "/alive".to_string(),
            ],
            captured_headers: vec!["User-Agent".to_string()],
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AgentConfig {
    /// Create configuration from `NETWATCH_*` environment variables.
    pub fn from_env() -> Result<Self, AgentError> {
        let defaults = AgentConfig::default();

        let api_key = env::var("NETWATCH_API_KEY").unwrap_or_default();
        let collector_endpoint = env::var("NETWATCH_COLLECTOR_ENDPOINT").unwrap_or_default();
        let flush_interval_secs = env::var("NETWATCH_FLUSH_INTERVAL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FLUSH_INTERVAL_SECS);
        let max_buffer_size = env::var("NETWATCH_MAX_BUFFER_SIZE")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_BUFFER_SIZE);
        let sample_rate = env::var("NETWATCH_SAMPLE_RATE")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
            .unwrap_or(1.0);
        let ignore_paths = env::var("NETWATCH_IGNORE_PATHS")
            .map(|val| parse_list(&val))
            .unwrap_or(defaults.ignore_paths);
        let captured_headers = env::var("NETWATCH_CAPTURED_HEADERS")
            .map(|val| parse_list(&val))
            .unwrap_or(defaults.captured_headers);
        let request_timeout_secs = env::var("NETWATCH_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let config = Self {
            api_key,
            collector_endpoint,
            flush_interval_secs,
            max_buffer_size,
            sample_rate,
            ignore_paths,
            captured_headers,
            request_timeout_secs,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.api_key.trim().is_empty() {
            return Err(AgentError::InvalidConfig(
                "API key is required".to_string(),
            ));
        }

        if self.collector_endpoint.trim().is_empty() {
            return Err(AgentError::InvalidConfig(
                "Collector endpoint is required".to_string(),
            ));
        }

        if !self.collector_endpoint.starts_with("http://")
            && !self.collector_endpoint.starts_with("https://")
        {
            return Err(AgentError::InvalidConfig(format!(
                "Collector endpoint '{}' must be an http(s) URL",
                self.collector_endpoint
            )));
        }

        if self.flush_interval_secs == 0 {
            return Err(AgentError::InvalidConfig(
                "Flush interval must be greater than 0".to_string(),
            ));
        }

        if self.max_buffer_size == 0 {
            return Err(AgentError::InvalidConfig(
                "Max buffer size must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(AgentError::InvalidConfig(format!(
                "Sample rate {} must be between 0.0 and 1.0",
                self.sample_rate
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(AgentError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn valid_config() -> AgentConfig {
        AgentConfig {
            api_key: "nw_test_key".to_string(),
            collector_endpoint: "http://localhost:5001".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_default_config_is_incomplete() {
        // No key or endpoint until the host provides them.
        assert!(AgentConfig::default().validate().is_err());
    }

    #[test]
    fn test_validate_missing_api_key() {
        let config = AgentConfig {
            api_key: "   ".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_non_http_endpoint() {
        let config = AgentConfig {
            collector_endpoint: "localhost:5001".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_interval_and_size() {
        let config = AgentConfig {
            flush_interval_secs: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());

        let config = AgentConfig {
            max_buffer_size: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_sample_rate_bounds() {
        for rate in [0.0, 0.25, 1.0] {
            let config = AgentConfig {
                sample_rate: rate,
                ..valid_config()
            };
            assert!(config.validate().is_ok(), "rate {rate} should be valid");
        }
        for rate in [-0.1, 1.1] {
            let config = AgentConfig {
                sample_rate: rate,
                ..valid_config()
            };
            assert!(config.validate().is_err(), "rate {rate} should be invalid");
        }
    }

    #[test]
    fn test_parse_list_trims_and_drops_empties() {
        assert_eq!(
            parse_list("/health, /ready ,,/alive"),
            vec!["/health", "/ready", "/alive"]
        );
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        env::set_var("NETWATCH_API_KEY", "nw_env_key");
        env::set_var("NETWATCH_COLLECTOR_ENDPOINT", "http://collector:5001");
        env::set_var("NETWATCH_FLUSH_INTERVAL_SECS", "9");
        env::set_var("NETWATCH_MAX_BUFFER_SIZE", "50");
        env::set_var("NETWATCH_SAMPLE_RATE", "0.5");
        env::set_var("NETWATCH_IGNORE_PATHS", "/ping,/metrics");

        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.api_key, "nw_env_key");
        assert_eq!(config.flush_interval_secs, 9);
        assert_eq!(config.max_buffer_size, 50);
        assert_eq!(config.sample_rate, 0.5);
        assert_eq!(config.ignore_paths, vec!["/ping", "/metrics"]);

        for var in [
            "NETWATCH_API_KEY",
            "NETWATCH_COLLECTOR_ENDPOINT",
            "NETWATCH_FLUSH_INTERVAL_SECS",
            "NETWATCH_MAX_BUFFER_SIZE",
            "NETWATCH_SAMPLE_RATE",
            "NETWATCH_IGNORE_PATHS",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_fails_fast_without_endpoint() {
        env::set_var("NETWATCH_API_KEY", "nw_env_key");
        env::remove_var("NETWATCH_COLLECTOR_ENDPOINT");

        assert!(AgentConfig::from_env().is_err());

        env::remove_var("NETWATCH_API_KEY");
    }
}
