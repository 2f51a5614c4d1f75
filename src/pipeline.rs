//! End-to-end run over one aligned pair.
//!
//! cointegration gate → Kalman filter → spread → z-score → strategy engine.
//! The cointegration verdict is advisory: a pair that fails the test is
//! still traded, with a warning.

use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::backtest::{BacktestResult, StrategyEngine};
use crate::cointegration::{CointegrationResult, CointegrationTest, PairDiagnostics};
use crate::config::PipelineConfig;
use crate::data::AlignedSeries;
use crate::error::{PipelineError, Result};
use crate::math::KalmanHedgeRatio;
use crate::signal::{compute_spread, rolling_zscore};

/// Everything one run produces, index-aligned with the input series.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub timestamps: Vec<i64>,
    pub hedge_ratio: Vec<f64>,
    pub intercept: Vec<f64>,
    pub spread: Vec<f64>,
    pub zscore: Vec<f64>,
    pub cointegration: CointegrationResult,
    pub diagnostics: PairDiagnostics,
    pub backtest: BacktestResult,
}

impl PipelineOutput {
    /// Per-bar signal table: timestamp, y, x, hedge_ratio, intercept, spread, zscore.
    pub fn signal_frame(&self, series: &AlignedSeries) -> Result<DataFrame> {
        PipelineError::check_len("signal frame (series vs output)", self.timestamps.len(), series.len())?;
        let df = df! {
            "timestamp" => self.timestamps.clone(),
            "y" => series.y.clone(),
            "x" => series.x.clone(),
            "hedge_ratio" => self.hedge_ratio.clone(),
            "intercept" => self.intercept.clone(),
            "spread" => self.spread.clone(),
            "zscore" => self.zscore.clone(),
        }?;
        Ok(df)
    }
}

/// Run the full pipeline.
///
/// Fails on an invalid config, an empty series, or any error from the
/// cointegration test. Warm-up bars are not errors; they carry NaN
/// z-scores and never trade.
pub fn run(
    series: &AlignedSeries,
    coint_test: &dyn CointegrationTest,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    config.validate().map_err(PipelineError::InvalidConfig)?;
    if series.is_empty() {
        return Err(PipelineError::InsufficientData {
            expected: 1,
            actual: 0,
        });
    }

    info!(
        y = %series.symbol_y,
        x = %series.symbol_x,
        bars = series.len(),
        window = config.window,
        z_entry = config.z_entry,
        z_exit = config.z_exit,
        "Starting pairs pipeline"
    );

    let cointegration = coint_test.test(&series.columns())?;
    if !cointegration.cointegrated {
        warn!(
            y = %series.symbol_y,
            x = %series.symbol_x,
            statistic = format!("{:.2}", cointegration.statistic),
            critical = format!("{:.2}", cointegration.critical_value),
            "Pair is not cointegrated at {}; proceeding anyway",
            cointegration.significance
        );
    }

    let diagnostics = PairDiagnostics::compute(&series.y, &series.x);

    let mut kalman = KalmanHedgeRatio::from_config(&config.kalman)?;
    let estimates = kalman.filter(&series.y, &series.x)?;

    let spread = compute_spread(
        &series.y,
        &series.x,
        &estimates.hedge_ratio,
        &estimates.intercept,
    )?;
    let zscore = rolling_zscore(&spread, config.window)?;

    let engine = StrategyEngine::new(config.z_entry, config.z_exit)?;
    let backtest = engine.run(&zscore, &series.y, &series.x, &estimates.hedge_ratio)?;

    Ok(PipelineOutput {
        timestamps: series.timestamps.clone(),
        hedge_ratio: estimates.hedge_ratio,
        intercept: estimates.intercept,
        spread,
        zscore,
        cointegration,
        diagnostics,
        backtest,
    })
}
