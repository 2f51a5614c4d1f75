//! Backtesting of the z-score mean-reversion strategy.
//!
//! The engine simulates one logical unit of the dollar-neutral pair and
//! returns every closed trade together with aggregate statistics.

pub mod engine;

pub use engine::{Bar, Entry, Position, StrategyEngine, DEFAULT_Z_ENTRY, DEFAULT_Z_EXIT};

use serde::Serialize;
use std::fmt;

/// Spread direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Long Y, short X
    LongSpread,
    /// Short Y, long X
    ShortSpread,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::LongSpread => write!(f, "LONG_SPREAD"),
            Direction::ShortSpread => write!(f, "SHORT_SPREAD"),
        }
    }
}

/// A closed position. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub direction: Direction,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_y: f64,
    pub entry_x: f64,
    pub exit_y: f64,
    pub exit_x: f64,
    pub entry_hedge_ratio: f64,
    /// Ratio used for the realized PnL
    pub exit_hedge_ratio: f64,
    /// Realized PnL per unit of Y. May be non-finite if inputs were.
    pub pnl: f64,
}

/// Outcome of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    /// Closed trades in order of exit
    pub trades: Vec<Trade>,
    /// Sum of finite trade PnLs
    pub total_profit: f64,
    /// Position left open when the data ended (its PnL is not recorded)
    pub final_position: Position,
}

impl BacktestResult {
    pub fn new(trades: Vec<Trade>, final_position: Position) -> Self {
        let total_profit = nan_safe_sum(trades.iter().map(|t| t.pnl));
        Self {
            trades,
            total_profit,
            final_position,
        }
    }

    /// Per-trade PnLs in log order, including non-finite ones.
    pub fn pnls(&self) -> Vec<f64> {
        self.trades.iter().map(|t| t.pnl).collect()
    }

    pub fn winning_trades(&self) -> usize {
        self.trades.iter().filter(|t| t.pnl > 0.0).count()
    }

    pub fn losing_trades(&self) -> usize {
        self.trades.iter().filter(|t| t.pnl < 0.0).count()
    }

    /// Fraction of trades with positive PnL (0 when there are no trades).
    pub fn win_rate(&self) -> f64 {
        if self.trades.is_empty() {
            return 0.0;
        }
        self.winning_trades() as f64 / self.trades.len() as f64
    }

    /// Per-trade Sharpe ratio (mean / sample std of finite PnLs), not annualized.
    pub fn sharpe_ratio(&self) -> f64 {
        let pnls: Vec<f64> = self
            .trades
            .iter()
            .map(|t| t.pnl)
            .filter(|p| p.is_finite())
            .collect();
        if pnls.len() < 2 {
            return 0.0;
        }

        let n = pnls.len() as f64;
        let mean = pnls.iter().sum::<f64>() / n;
        let variance = pnls.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std_dev = variance.sqrt();

        if std_dev.abs() < f64::EPSILON {
            return 0.0;
        }
        mean / std_dev
    }

    /// Largest peak-to-trough decline of cumulative finite PnL.
    pub fn max_drawdown(&self) -> f64 {
        let mut equity = 0.0_f64;
        let mut peak = 0.0_f64;
        let mut max_dd = 0.0_f64;
        for pnl in self.trades.iter().map(|t| t.pnl).filter(|p| p.is_finite()) {
            equity += pnl;
            peak = peak.max(equity);
            max_dd = max_dd.max(peak - equity);
        }
        max_dd
    }
}

/// Sum ignoring non-finite values.
pub fn nan_safe_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().filter(|v| v.is_finite()).sum()
}
