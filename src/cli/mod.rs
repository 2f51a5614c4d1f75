//! CLI argument parsing using clap.
//!
//! This module defines the command-line interface for kalman-pairs,
//! including all subcommands and their arguments.

mod config;

pub use config::{
    duration_to_candles, resolve_pipeline_config, symbol_from_path, BacktestCliConfig,
    CliConfigError, CointCliConfig, ConfigOverrides, DataSource,
};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// kalman-pairs - Kalman-filter pairs trading research tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,
}

/// Price data flags shared by all commands
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// CSV with the dependent leg (Y), e.g. data/DOT-USD.csv
    #[arg(long)]
    pub y_csv: Option<String>,
    /// CSV with the independent leg (X), e.g. data/ADA-USD.csv
    #[arg(long)]
    pub x_csv: Option<String>,
    /// Use a generated cointegrated pair (no CSV files required)
    #[arg(long, default_value_t = false)]
    pub synthetic: bool,
    /// Length of the synthetic series in hourly candles (e.g., "7d", "30d", "1y")
    #[arg(long, default_value = "30d")]
    pub duration: String,
    /// Seed for the synthetic generator
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl DataArgs {
    pub fn to_source(&self) -> Result<DataSource, CliConfigError> {
        DataSource::from_args(
            self.y_csv.as_deref(),
            self.x_csv.as_deref(),
            self.synthetic,
            &self.duration,
            self.seed,
        )
    }
}

/// Flags of the `backtest` command
#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub data: DataArgs,
    /// JSON pipeline configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Rolling z-score window in bars
    #[arg(long)]
    pub window: Option<usize>,
    /// Entry threshold on |z|
    #[arg(long)]
    pub z_entry: Option<f64>,
    /// Exit threshold on z
    #[arg(long, allow_negative_numbers = true)]
    pub z_exit: Option<f64>,
    /// Cointegration significance: 0.10, 0.05 or 0.01
    #[arg(long)]
    pub significance: Option<String>,
    /// Output directory for results
    #[arg(long, default_value = "backtest_results")]
    pub output_dir: PathBuf,
}

impl BacktestArgs {
    /// Validate the flags into a [`BacktestCliConfig`].
    pub fn to_config(&self) -> Result<BacktestCliConfig, CliConfigError> {
        let overrides = ConfigOverrides {
            window: self.window,
            z_entry: self.z_entry,
            z_exit: self.z_exit,
            significance: self.significance.clone(),
        };
        Ok(BacktestCliConfig {
            source: self.data.to_source()?,
            pipeline: resolve_pipeline_config(self.config.as_deref(), &overrides)?,
            output_dir: self.output_dir.clone(),
        })
    }
}

/// Flags of the `coint` command
#[derive(Args, Debug, Clone)]
pub struct CointArgs {
    #[command(flatten)]
    pub data: DataArgs,
    /// Significance level: 0.10, 0.05 or 0.01
    #[arg(long, default_value = "0.05")]
    pub significance: String,
}

impl CointArgs {
    pub fn to_config(&self) -> Result<CointCliConfig, CliConfigError> {
        Ok(CointCliConfig {
            source: self.data.to_source()?,
            significance: self
                .significance
                .parse()
                .map_err(CliConfigError::InvalidSignificance)?,
        })
    }
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the Kalman pairs backtest and write results, signal and trade files
    Backtest(BacktestArgs),

    /// Test a pair for cointegration and print its diagnostics
    Coint(CointArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cointegration::Significance;

    #[test]
    fn test_parse_backtest_synthetic() {
        let cli = Cli::parse_from([
            "kalman-pairs",
            "--verbose",
            "debug",
            "backtest",
            "--synthetic",
            "--duration",
            "7d",
            "--window",
            "30",
            "--z-entry",
            "1.5",
        ]);
        assert_eq!(cli.verbose, "debug");
        assert!(!cli.json_logs);

        let Commands::Backtest(args) = cli.command else {
            panic!("expected backtest command");
        };
        let config = args.to_config().unwrap();
        assert_eq!(
            config.source,
            DataSource::Synthetic {
                candles: 168,
                seed: 42
            }
        );
        assert_eq!(config.pipeline.window, 30);
        assert_eq!(config.pipeline.z_entry, 1.5);
        assert_eq!(config.output_dir, PathBuf::from("backtest_results"));
    }

    #[test]
    fn test_parse_coint_csv() {
        let cli = Cli::parse_from([
            "kalman-pairs",
            "coint",
            "--y-csv",
            "data/DOT-USD.csv",
            "--x-csv",
            "data/ADA-USD.csv",
            "--significance",
            "0.01",
            "--json-logs",
        ]);
        assert!(cli.json_logs);
        let Commands::Coint(args) = cli.command else {
            panic!("expected coint command");
        };
        let config = args.to_config().unwrap();
        assert!(matches!(config.source, DataSource::Csv { .. }));
        assert_eq!(config.significance, Significance::OnePercent);
    }

    #[test]
    fn test_backtest_requires_data() {
        let cli = Cli::parse_from(["kalman-pairs", "backtest"]);
        let Commands::Backtest(args) = cli.command else {
            panic!("expected backtest command");
        };
        assert!(matches!(
            args.to_config(),
            Err(CliConfigError::MissingCsvPaths)
        ));
    }
}
