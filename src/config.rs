//! Configuration for the pairs pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::backtest::{DEFAULT_Z_ENTRY, DEFAULT_Z_EXIT};
use crate::cointegration::Significance;
use crate::error::{PipelineError, Result};
use crate::math::KalmanConfig;
use crate::signal::DEFAULT_WINDOW;

/// Parameters for one pipeline run.
///
/// Every field has a default, so a partial JSON file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rolling z-score window in bars
    #[serde(default = "default_window")]
    pub window: usize,

    /// Enter when |z| exceeds this
    #[serde(default = "default_z_entry")]
    pub z_entry: f64,

    /// Exit once z crosses back to this level
    #[serde(default = "default_z_exit")]
    pub z_exit: f64,

    #[serde(default)]
    pub kalman: KalmanConfig,

    /// Significance of the cointegration gate
    #[serde(default)]
    pub significance: Significance,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_z_entry() -> f64 {
    DEFAULT_Z_ENTRY
}

fn default_z_exit() -> f64 {
    DEFAULT_Z_EXIT
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            z_entry: default_z_entry(),
            z_exit: default_z_exit(),
            kalman: KalmanConfig::default(),
            significance: Significance::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate().map_err(PipelineError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.window == 0 {
            return Err("window must be at least 1".to_string());
        }
        if !self.z_entry.is_finite() || self.z_entry <= 0.0 {
            return Err(format!("z_entry must be positive, got {}", self.z_entry));
        }
        if !self.z_exit.is_finite() {
            return Err(format!("z_exit must be finite, got {}", self.z_exit));
        }
        self.kalman.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.window, 20);
        assert_eq!(config.z_entry, 2.0);
        assert_eq!(config.z_exit, 0.0);
        assert_eq!(config.significance, Significance::FivePercent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = PipelineConfig {
            window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.window = 10;
        config.z_entry = -1.0;
        assert!(config.validate().is_err());

        config.z_entry = 1.0;
        config.z_exit = f64::NAN;
        assert!(config.validate().is_err());

        config.z_exit = 1.0;
        assert!(config.validate().is_ok());

        config.z_exit = 1.5;
        assert!(config.validate().is_ok());

        config.kalman.delta = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"window": 30, "significance": "0.01"}"#).unwrap();
        assert_eq!(config.window, 30);
        assert_eq!(config.z_entry, 2.0);
        assert_eq!(config.significance, Significance::OnePercent);
        assert_eq!(config.kalman, KalmanConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"z_entry": 1.5, "z_exit": 0.25, "kalman": {{"delta": 0.0001}}}}"#).unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.z_entry, 1.5);
        assert_eq!(config.kalman.delta, 0.0001);
        assert_eq!(config.kalman.observation_variance, 1.0);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"window": 0}}"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_file(file.path()),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
