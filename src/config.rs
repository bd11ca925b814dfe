//! Probe thresholds.
//!
//! Every field is optional. A probe whose threshold is absent reports `NA`
//! instead of guessing, so an empty configuration is valid and simply turns
//! the configurable probes off.
//!
//! Configuration is read from an optional file (TOML, JSON or YAML, chosen by
//! extension) and then from `BROKERPROBE_*` environment variables, which win:
//!
//! ```toml
//! consumer_utilization_threshold = 0.5
//! queue_high_flow_threshold = 100
//! ```
//!
//! `BROKERPROBE_QUEUE_LOW_FLOW_THRESHOLD=20` sets the matching field.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "BROKERPROBE";

/// Thresholds for the configurable probes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Consumer utilization below which a queue is unhealthy (0.0..=1.0).
    pub consumer_utilization_threshold: Option<f64>,
    /// Connections opened per second that count as churn.
    pub high_connection_creation_rate_threshold: Option<f64>,
    /// Connections closed per second that count as churn.
    pub high_connection_closure_rate_threshold: Option<f64>,
    pub file_descriptor_usage_threshold_coefficient: Option<f64>,
    pub socket_usage_threshold_coefficient: Option<f64>,
    pub runtime_process_usage_threshold_coefficient: Option<f64>,
    /// Incoming message total at or above which a queue is flooded.
    pub queue_high_flow_threshold: Option<u64>,
    /// Incoming message total at or below which a queue is starved.
    pub queue_low_flow_threshold: Option<u64>,
    pub message_redelivery_threshold_coefficient: Option<f64>,
}

impl ProbeConfig {
    /// Conventional values for a production broker.
    pub fn recommended() -> Self {
        Self {
            consumer_utilization_threshold: Some(0.50),
            high_connection_creation_rate_threshold: Some(100.0),
            high_connection_closure_rate_threshold: Some(100.0),
            file_descriptor_usage_threshold_coefficient: Some(0.90),
            socket_usage_threshold_coefficient: Some(0.60),
            runtime_process_usage_threshold_coefficient: Some(0.70),
            queue_high_flow_threshold: Some(100),
            queue_low_flow_threshold: Some(20),
            message_redelivery_threshold_coefficient: Some(0.50),
        }
    }

    /// Load from `path` (if given) and the environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: ProbeConfig = builder
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Values set in `other` replace the ones in `self`.
    pub fn overlay(self, other: &ProbeConfig) -> Self {
        Self {
            consumer_utilization_threshold: other
                .consumer_utilization_threshold
                .or(self.consumer_utilization_threshold),
            high_connection_creation_rate_threshold: other
                .high_connection_creation_rate_threshold
                .or(self.high_connection_creation_rate_threshold),
            high_connection_closure_rate_threshold: other
                .high_connection_closure_rate_threshold
                .or(self.high_connection_closure_rate_threshold),
            file_descriptor_usage_threshold_coefficient: other
                .file_descriptor_usage_threshold_coefficient
                .or(self.file_descriptor_usage_threshold_coefficient),
            socket_usage_threshold_coefficient: other
                .socket_usage_threshold_coefficient
                .or(self.socket_usage_threshold_coefficient),
            runtime_process_usage_threshold_coefficient: other
                .runtime_process_usage_threshold_coefficient
                .or(self.runtime_process_usage_threshold_coefficient),
            queue_high_flow_threshold: other
                .queue_high_flow_threshold
                .or(self.queue_high_flow_threshold),
            queue_low_flow_threshold: other
                .queue_low_flow_threshold
                .or(self.queue_low_flow_threshold),
            message_redelivery_threshold_coefficient: other
                .message_redelivery_threshold_coefficient
                .or(self.message_redelivery_threshold_coefficient),
        }
    }

    /// Check ranges: ratios and coefficients in `0.0..=1.0`, rates finite
    /// and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval(
            "consumer_utilization_threshold",
            self.consumer_utilization_threshold,
        )?;
        unit_interval(
            "file_descriptor_usage_threshold_coefficient",
            self.file_descriptor_usage_threshold_coefficient,
        )?;
        unit_interval(
            "socket_usage_threshold_coefficient",
            self.socket_usage_threshold_coefficient,
        )?;
        unit_interval(
            "runtime_process_usage_threshold_coefficient",
            self.runtime_process_usage_threshold_coefficient,
        )?;
        unit_interval(
            "message_redelivery_threshold_coefficient",
            self.message_redelivery_threshold_coefficient,
        )?;
        non_negative(
            "high_connection_creation_rate_threshold",
            self.high_connection_creation_rate_threshold,
        )?;
        non_negative(
            "high_connection_closure_rate_threshold",
            self.high_connection_closure_rate_threshold,
        )?;
        Ok(())
    }
}

fn unit_interval(field: &'static str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.is_finite() || !(0.0..=1.0).contains(&v) => Err(ConfigError::Invalid {
            field,
            reason: format!("{v} is outside 0.0..=1.0"),
        }),
        _ => Ok(()),
    }
}

fn non_negative(field: &'static str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ConfigError::Invalid {
            field,
            reason: format!("{v} is not a finite non-negative number"),
        }),
        _ => Ok(()),
    }
}
