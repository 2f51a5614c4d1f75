//! Threshold mean-reversion engine over a z-score signal.
//!
//! One unit of the dollar-neutral pair is traded at a time:
//!
//! ```text
//!            z > z_entry                 z <= z_exit
//!   FLAT ─────────────────▶ SHORT_SPREAD ────────────▶ FLAT (trade logged)
//!     │      z < -z_entry                z >= z_exit
//!     └───────────────────▶ LONG_SPREAD  ────────────▶ FLAT (trade logged)
//! ```
//!
//! Bars with a non-finite z-score are skipped entirely. Entry is only evaluated
//! while flat and exit only while positioned, so a bar never both closes and
//! reopens. A position still open when the data ends is not closed.

use serde::Serialize;
use tracing::{debug, info};

use super::{BacktestResult, Direction, Trade};
use crate::error::{PipelineError, Result};

/// Default entry threshold (|z| must exceed this to open)
pub const DEFAULT_Z_ENTRY: f64 = 2.0;
/// Default exit threshold (mean reversion target)
pub const DEFAULT_Z_EXIT: f64 = 0.0;

/// Inputs for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub zscore: f64,
    pub y: f64,
    pub x: f64,
    pub hedge_ratio: f64,
}

/// Snapshot taken when a position is opened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Entry {
    /// Bar index of the entry
    pub index: usize,
    /// Dependent leg price at entry
    pub y: f64,
    /// Independent leg price at entry
    pub x: f64,
    /// Hedge ratio at entry (informational; PnL uses the exit-bar ratio)
    pub hedge_ratio: f64,
}

/// Position state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "entry", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    #[default]
    Flat,
    /// Long Y, short `hedge_ratio` units of X
    LongSpread(Entry),
    /// Short Y, long `hedge_ratio` units of X
    ShortSpread(Entry),
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Position::Flat => None,
            Position::LongSpread(_) => Some(Direction::LongSpread),
            Position::ShortSpread(_) => Some(Direction::ShortSpread),
        }
    }

    pub fn entry(&self) -> Option<&Entry> {
        match self {
            Position::Flat => None,
            Position::LongSpread(entry) | Position::ShortSpread(entry) => Some(entry),
        }
    }
}

/// Stateless driver of the position state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyEngine {
    z_entry: f64,
    z_exit: f64,
}

impl Default for StrategyEngine {
    fn default() -> Self {
        Self {
            z_entry: DEFAULT_Z_ENTRY,
            z_exit: DEFAULT_Z_EXIT,
        }
    }
}

impl StrategyEngine {
    /// Create an engine. `z_entry` must be positive and both thresholds finite.
    pub fn new(z_entry: f64, z_exit: f64) -> Result<Self> {
        if !(z_entry.is_finite() && z_entry > 0.0) {
            return Err(PipelineError::InvalidInput(format!(
                "z_entry must be positive, got {}",
                z_entry
            )));
        }
        if !z_exit.is_finite() {
            return Err(PipelineError::InvalidInput(format!(
                "z_exit must be finite, got {}",
                z_exit
            )));
        }
        Ok(Self { z_entry, z_exit })
    }

    pub fn z_entry(&self) -> f64 {
        self.z_entry
    }

    pub fn z_exit(&self) -> f64 {
        self.z_exit
    }

    /// Advance the state machine by one bar.
    ///
    /// Returns the closed trade if this bar triggered an exit.
    pub fn step(&self, position: &mut Position, index: usize, bar: &Bar) -> Option<Trade> {
        let z = bar.zscore;
        if !z.is_finite() {
            return None;
        }

        match *position {
            Position::Flat => {
                let entry = Entry {
                    index,
                    y: bar.y,
                    x: bar.x,
                    hedge_ratio: bar.hedge_ratio,
                };
                if z > self.z_entry {
                    *position = Position::ShortSpread(entry);
                    info!(
                        index,
                        z = format!("{:.2}", z),
                        y = bar.y,
                        x = bar.x,
                        "Enter SHORT spread (short Y, long X)"
                    );
                } else if z < -self.z_entry {
                    *position = Position::LongSpread(entry);
                    info!(
                        index,
                        z = format!("{:.2}", z),
                        y = bar.y,
                        x = bar.x,
                        "Enter LONG spread (long Y, short X)"
                    );
                }
                None
            }
            Position::LongSpread(entry) => {
                if z < self.z_exit {
                    debug!(index, z, "Holding LONG spread");
                    return None;
                }
                // PnL hedged with the current bar's ratio
                let pnl = (bar.y - entry.y) - bar.hedge_ratio * (bar.x - entry.x);
                *position = Position::Flat;
                Some(Self::close(Direction::LongSpread, entry, index, bar, pnl, z))
            }
            Position::ShortSpread(entry) => {
                if z > self.z_exit {
                    debug!(index, z, "Holding SHORT spread");
                    return None;
                }
                let pnl = (entry.y - bar.y) - bar.hedge_ratio * (entry.x - bar.x);
                *position = Position::Flat;
                Some(Self::close(Direction::ShortSpread, entry, index, bar, pnl, z))
            }
        }
    }

    fn close(direction: Direction, entry: Entry, index: usize, bar: &Bar, pnl: f64, z: f64) -> Trade {
        info!(
            index,
            direction = %direction,
            z = format!("{:.2}", z),
            pnl = format!("{:.4}", pnl),
            "Exit position"
        );
        Trade {
            direction,
            entry_index: entry.index,
            exit_index: index,
            entry_y: entry.y,
            entry_x: entry.x,
            exit_y: bar.y,
            exit_x: bar.x,
            entry_hedge_ratio: entry.hedge_ratio,
            exit_hedge_ratio: bar.hedge_ratio,
            pnl,
        }
    }

    /// Simulate the strategy over full aligned sequences from a flat start.
    ///
    /// All four inputs must have the same length (`DimensionMismatch`
    /// otherwise).
    pub fn run(
        &self,
        zscore: &[f64],
        y: &[f64],
        x: &[f64],
        hedge_ratio: &[f64],
    ) -> Result<BacktestResult> {
        let n = zscore.len();
        PipelineError::check_len("backtest (y vs zscore)", n, y.len())?;
        PipelineError::check_len("backtest (x vs zscore)", n, x.len())?;
        PipelineError::check_len("backtest (hedge ratio vs zscore)", n, hedge_ratio.len())?;

        let mut position = Position::Flat;
        let mut trades: Vec<Trade> = Vec::new();

        for i in 0..n {
            let bar = Bar {
                zscore: zscore[i],
                y: y[i],
                x: x[i],
                hedge_ratio: hedge_ratio[i],
            };
            if let Some(trade) = self.step(&mut position, i, &bar) {
                trades.push(trade);
            }
        }

        let result = BacktestResult::new(trades, position);
        info!(
            trades = result.trades.len(),
            total_profit = format!("{:.4}", result.total_profit),
            open_at_end = !result.final_position.is_flat(),
            "Backtest complete"
        );
        Ok(result)
    }
}
