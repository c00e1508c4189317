//! Tunable thresholds for the causality layer
//!
//! Stored as JSON alongside the rest of an application's sync configuration.
//! Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::identity::DeviceId;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalConfig {
    /// Merged resolutions over at least this many operations get low confidence
    pub merge_low_confidence_operation_threshold: usize,

    /// Resolutions older than this are considered stale
    pub resolution_max_age_ms: i64,

    /// Timestamps older than this are considered stale
    pub timestamp_max_age_ms: i64,

    /// Prefix for generated device ids
    pub generated_device_prefix: String,
}

impl Default for CausalConfig {
    fn default() -> Self {
        Self {
            merge_low_confidence_operation_threshold: 10,
            resolution_max_age_ms: 24 * 60 * 60 * 1000,
            timestamp_max_age_ms: 60 * 60 * 1000,
            generated_device_prefix: crate::identity::DEFAULT_GENERATED_PREFIX.to_string(),
        }
    }
}

impl CausalConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json_str(&data)
    }

    /// A fresh random device id under the configured prefix
    pub fn generate_device_id(&self, clock: &dyn Clock) -> Result<DeviceId, ValidationError> {
        DeviceId::generate_random_with(clock, &self.generated_device_prefix)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merge_low_confidence_operation_threshold == 0 {
            return Err(ConfigError::Invalid(
                "merge_low_confidence_operation_threshold must be at least 1".into(),
            ));
        }
        if self.resolution_max_age_ms < 0 || self.timestamp_max_age_ms < 0 {
            return Err(ConfigError::Invalid("max ages cannot be negative".into()));
        }
        // Generated ids add two base36 segments of at most 9 and 13 characters
        let sample = format!("{}-{}-{}", self.generated_device_prefix, "z".repeat(9), "z".repeat(13));
        DeviceId::create(&sample)
            .map_err(|e| ConfigError::Invalid(format!("generated_device_prefix: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CausalConfig::default();
        assert_eq!(config.merge_low_confidence_operation_threshold, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_device_id_uses_prefix() {
        let config = CausalConfig {
            generated_device_prefix: "tablet".into(),
            ..CausalConfig::default()
        };
        let id = config.generate_device_id(&crate::clock::SystemClock).unwrap();
        assert!(id.as_str().starts_with("tablet-"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            CausalConfig::from_json_str(r#"{ "merge_low_confidence_operation_threshold": 4 }"#)
                .unwrap();
        assert_eq!(config.merge_low_confidence_operation_threshold, 4);
        assert_eq!(config.generated_device_prefix, "device");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            CausalConfig::from_json_str(r#"{ "merge_low_confidence_operation_threshold": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CausalConfig::from_json_str(r#"{ "generated_device_prefix": "has space" }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CausalConfig::from_json_str("not json"),
            Err(ConfigError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("causal.json");
        std::fs::write(&path, r#"{ "resolution_max_age_ms": 5000 }"#).unwrap();

        let config = CausalConfig::load(&path).unwrap();
        assert_eq!(config.resolution_max_age_ms, 5000);
        assert_eq!(config.timestamp_max_age_ms, CausalConfig::default().timestamp_max_age_ms);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            CausalConfig::load(Path::new("/nonexistent/causal.json")),
            Err(ConfigError::IoError(_))
        ));
    }
}
