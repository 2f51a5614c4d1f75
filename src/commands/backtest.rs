//! Backtest command handler.
//!
//! Implements the `backtest` subcommand: load the pair, run the pipeline and
//! write `results.json`, `signal.csv` and `trades.csv` to the output directory.

use crate::backtest::{Position, Trade};
use crate::cli::BacktestCliConfig;
use crate::cointegration::{CointegrationResult, EngleGranger, PairDiagnostics};
use crate::config::PipelineConfig;
use crate::logging::{CsvRecorder, MultiRecorder, TracingRecorder, TradeRecord, TradeRecorder};
use crate::pipeline;

use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Backtest results in JSON-serializable format.
#[derive(Debug, Serialize)]
struct BacktestOutput<'a> {
    symbol_y: &'a str,
    symbol_x: &'a str,
    bars: usize,
    start: Option<String>,
    end: Option<String>,
    config: &'a PipelineConfig,
    cointegration: &'a CointegrationResult,
    diagnostics: &'a PairDiagnostics,
    total_profit: f64,
    total_trades: usize,
    winning_trades: usize,
    losing_trades: usize,
    win_rate_pct: f64,
    sharpe_ratio: f64,
    max_drawdown: f64,
    final_position: &'a Position,
    trades: &'a [Trade],
}

/// Run a backtest with the provided CLI configuration.
///
/// # Errors
/// Returns error if data loading, the pipeline or writing outputs fails.
pub async fn run_backtest(config: BacktestCliConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- Running Backtest ---");
    info!(
        source = ?config.source,
        window = config.pipeline.window,
        z_entry = config.pipeline.z_entry,
        z_exit = config.pipeline.z_exit,
        significance = %config.pipeline.significance,
        "Backtest configuration"
    );

    let series = super::load_series(&config.source)?;
    info!(rows = series.len(), "Data loaded");

    let coint_test = EngleGranger::new(config.pipeline.significance);
    let output = pipeline::run(&series, &coint_test, &config.pipeline)?;
    let result = &output.backtest;

    info!("--- Backtest Results ---");
    info!("Pair:            {}/{}", series.symbol_y, series.symbol_x);
    info!("Cointegrated:    {}", output.cointegration.cointegrated);
    info!("Total Profit:    {:.4}", result.total_profit);
    info!("Total Trades:    {}", result.trades.len());
    info!("Winning Trades:  {}", result.winning_trades());
    info!("Losing Trades:   {}", result.losing_trades());
    info!("Win Rate:        {:.2}%", result.win_rate() * 100.0);
    info!("Sharpe (trade):  {:.3}", result.sharpe_ratio());
    info!("Max Drawdown:    {:.4}", result.max_drawdown());
    info!("------------------------");

    fs::create_dir_all(&config.output_dir)?;

    let (start, end) = series
        .date_range()
        .map(|(s, e)| (s.to_rfc3339(), e.to_rfc3339()))
        .unzip();
    let summary = BacktestOutput {
        symbol_y: &series.symbol_y,
        symbol_x: &series.symbol_x,
        bars: series.len(),
        start,
        end,
        config: &config.pipeline,
        cointegration: &output.cointegration,
        diagnostics: &output.diagnostics,
        total_profit: result.total_profit,
        total_trades: result.trades.len(),
        winning_trades: result.winning_trades(),
        losing_trades: result.losing_trades(),
        win_rate_pct: result.win_rate() * 100.0,
        sharpe_ratio: result.sharpe_ratio(),
        max_drawdown: result.max_drawdown(),
        final_position: &result.final_position,
        trades: &result.trades,
    };
    let results_path = config.output_dir.join("results.json");
    let mut file = File::create(&results_path)?;
    let json = serde_json::to_string_pretty(&summary)?;
    file.write_all(json.as_bytes())?;
    info!(path = %results_path.display(), "Results written");

    let signal_path = config.output_dir.join("signal.csv");
    write_signal_csv(&signal_path, &mut output.signal_frame(&series)?)?;
    info!(path = %signal_path.display(), "Signal written");

    let trades_path = config.output_dir.join("trades.csv");
    let recorder = MultiRecorder::new(vec![
        Box::new(CsvRecorder::truncate(trades_path.clone())?),
        Box::new(TracingRecorder::new()),
    ]);
    for trade in &result.trades {
        recorder.record(&TradeRecord::from_trade(trade, &series)?).await?;
    }
    recorder.flush().await?;
    info!(path = %trades_path.display(), trades = result.trades.len(), "Trades written");

    Ok(())
}

fn write_signal_csv(path: &Path, frame: &mut DataFrame) -> PolarsResult<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(frame)
}
