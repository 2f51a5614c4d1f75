//! CLI command handlers.
//!
//! This module contains the implementation for each CLI subcommand,
//! delegating to the data loaders and the pairs pipeline.

mod backtest;
mod coint;

pub use backtest::run_backtest;
pub use coint::run_coint;

use crate::cli::{symbol_from_path, CliConfigError, DataSource};
use crate::data::{generate_pair, AlignedSeries, PriceSeries, SyntheticPairConfig};

/// Load and align both legs of the pair.
pub fn load_series(source: &DataSource) -> Result<AlignedSeries, CliConfigError> {
    let series = match source {
        DataSource::Csv { y_path, x_path } => {
            let y = PriceSeries::from_csv(y_path, &symbol_from_path(y_path)?)?;
            let x = PriceSeries::from_csv(x_path, &symbol_from_path(x_path)?)?;
            AlignedSeries::inner_join(&y, &x)?
        }
        DataSource::Synthetic { candles, seed } => {
            generate_pair(*seed, *candles, &SyntheticPairConfig::default())?
        }
    };
    Ok(series)
}
