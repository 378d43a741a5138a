//! Configuration for the commutation checker.
//!
//! Values come from, highest precedence first:
//! 1. Environment variables (`QSYM_COMMUTE_` prefix)
//! 2. A YAML configuration file
//! 3. Defaults

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tolerances and limits used when deciding commutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommutationConfig {
    /// Absolute tolerance when comparing `AB` and `BA` in the matrix fallback.
    #[serde(default = "default_atol")]
    pub atol: f64,

    /// Tolerance when matching angles against special values during
    /// canonicalization.
    #[serde(default = "default_angle_atol")]
    pub angle_atol: f64,

    /// Largest combined wire count the matrix fallback will expand to.
    #[serde(default = "default_max_fallback_wires")]
    pub max_fallback_wires: usize,
}

fn default_atol() -> f64 {
    1e-8
}

fn default_angle_atol() -> f64 {
    1e-8
}

fn default_max_fallback_wires() -> usize {
    8
}

impl Default for CommutationConfig {
    fn default() -> Self {
        Self {
            atol: default_atol(),
            angle_atol: default_angle_atol(),
            max_fallback_wires: default_max_fallback_wires(),
        }
    }
}

/// Largest fallback size accepted by [`CommutationConfig::validate`].
const MAX_FALLBACK_WIRES_LIMIT: usize = 14;

impl CommutationConfig {
    /// Parse a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: CommutationConfig =
            serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml_str(&contents)
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Load with precedence: environment, then `config_file` if given, then
    /// defaults.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `QSYM_COMMUTE_*` overrides. Unparseable values are ignored.
    pub fn merge_env(mut self) -> Self {
        if let Ok(v) = std::env::var("QSYM_COMMUTE_ATOL") {
            if let Ok(val) = v.parse() {
                self.atol = val;
            }
        }
        if let Ok(v) = std::env::var("QSYM_COMMUTE_ANGLE_ATOL") {
            if let Ok(val) = v.parse() {
                self.angle_atol = val;
            }
        }
        if let Ok(v) = std::env::var("QSYM_COMMUTE_MAX_FALLBACK_WIRES") {
            if let Ok(val) = v.parse() {
                self.max_fallback_wires = val;
            }
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "atol must be positive, got {}",
                self.atol
            )));
        }
        if !(self.angle_atol.is_finite() && self.angle_atol > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "angle_atol must be positive, got {}",
                self.angle_atol
            )));
        }
        if self.max_fallback_wires == 0 || self.max_fallback_wires > MAX_FALLBACK_WIRES_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "max_fallback_wires must be between 1 and {MAX_FALLBACK_WIRES_LIMIT}, got {}",
                self.max_fallback_wires
            )));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CommutationConfig::default();
        assert_eq!(config.atol, 1e-8);
        assert_eq!(config.angle_atol, 1e-8);
        assert_eq!(config.max_fallback_wires, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = CommutationConfig::from_yaml_str("atol: 1.0e-6\n").unwrap();
        assert_eq!(config.atol, 1e-6);
        assert_eq!(config.max_fallback_wires, 8);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CommutationConfig::from_yaml_str("max_fallback_wires: 0\n"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            CommutationConfig::from_yaml_str("atol: -1.0\n"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            CommutationConfig::from_yaml_str("atol: [1, 2]\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CommutationConfig::from_file("/nonexistent/qsym-commute.yaml"),
            Err(ConfigError::IoError(_))
        ));
    }
}
