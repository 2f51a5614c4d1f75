//! CLI configuration structs bridging CLI arguments to domain types.
//!
//! These structs decouple the CLI parsing layer from the business logic,
//! allowing command handlers to work with validated, typed configurations.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cointegration::Significance;
use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Errors that can occur when turning CLI arguments into a configuration.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Invalid duration format: '{0}'. Expected format: 7d, 30d, 1y, 168h")]
    InvalidDurationFormat(String),

    #[error("Invalid number in duration '{0}': {1}")]
    InvalidDurationNumber(String, std::num::ParseIntError),

    #[error("Both --y-csv and --x-csv are required unless --synthetic is set")]
    MissingCsvPaths,

    #[error("Cannot derive a symbol from path '{0}'")]
    InvalidSymbolPath(String),

    #[error("Invalid significance: {0}")]
    InvalidSignificance(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Parse duration string to number of hourly candles.
///
/// # Supported Formats
/// - `7d` → 7 days × 24 hours = 168 candles
/// - `1y` → 365 days × 24 hours = 8760 candles
/// - `168h` → 168 hourly candles
pub fn duration_to_candles(duration: &str) -> Result<usize, CliConfigError> {
    const HOURS_PER_DAY: usize = 24;
    const DAYS_PER_YEAR: usize = 365;

    let s = duration.trim().to_lowercase();

    let (value_str, multiplier) = if let Some(d) = s.strip_suffix('d') {
        (d, HOURS_PER_DAY)
    } else if let Some(y) = s.strip_suffix('y') {
        (y, DAYS_PER_YEAR * HOURS_PER_DAY)
    } else if let Some(h) = s.strip_suffix('h') {
        (h, 1)
    } else {
        return Err(CliConfigError::InvalidDurationFormat(duration.to_string()));
    };

    let value: usize = value_str
        .parse()
        .map_err(|e| CliConfigError::InvalidDurationNumber(duration.to_string(), e))?;

    Ok(value.saturating_mul(multiplier))
}

/// Where the two price legs come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// One CSV per leg; symbols are taken from the file stems
    Csv {
        y_path: PathBuf,
        x_path: PathBuf,
    },
    /// Deterministic generated pair
    Synthetic { candles: usize, seed: u64 },
}

impl DataSource {
    /// Build from raw CLI flags.
    pub fn from_args(
        y_csv: Option<&str>,
        x_csv: Option<&str>,
        synthetic: bool,
        duration: &str,
        seed: u64,
    ) -> Result<Self, CliConfigError> {
        if synthetic {
            return Ok(Self::Synthetic {
                candles: duration_to_candles(duration)?,
                seed,
            });
        }
        match (y_csv, x_csv) {
            (Some(y), Some(x)) => Ok(Self::Csv {
                y_path: PathBuf::from(y),
                x_path: PathBuf::from(x),
            }),
            _ => Err(CliConfigError::MissingCsvPaths),
        }
    }
}

/// Symbol name for a CSV leg, e.g. `data/DOT-USD.csv` → `DOT-USD`.
pub fn symbol_from_path(path: &Path) -> Result<String, CliConfigError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CliConfigError::InvalidSymbolPath(path.display().to_string()))
}

/// Flag values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub window: Option<usize>,
    pub z_entry: Option<f64>,
    pub z_exit: Option<f64>,
    pub significance: Option<String>,
}

/// Load the config file (or defaults), apply flag overrides, validate.
pub fn resolve_pipeline_config(
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<PipelineConfig, CliConfigError> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(window) = overrides.window {
        config.window = window;
    }
    if let Some(z_entry) = overrides.z_entry {
        config.z_entry = z_entry;
    }
    if let Some(z_exit) = overrides.z_exit {
        config.z_exit = z_exit;
    }
    if let Some(raw) = &overrides.significance {
        config.significance = raw
            .parse::<Significance>()
            .map_err(CliConfigError::InvalidSignificance)?;
    }

    config
        .validate()
        .map_err(|e| CliConfigError::Pipeline(PipelineError::InvalidConfig(e)))?;
    Ok(config)
}

/// CLI configuration for the `backtest` command.
#[derive(Debug, Clone)]
pub struct BacktestCliConfig {
    pub source: DataSource,
    pub pipeline: PipelineConfig,
    /// Output directory for results.json, signal.csv and trades.csv
    pub output_dir: PathBuf,
}

/// CLI configuration for the `coint` command.
#[derive(Debug, Clone)]
pub struct CointCliConfig {
    pub source: DataSource,
    pub significance: Significance,
}
