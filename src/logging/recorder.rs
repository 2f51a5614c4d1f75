//! Trade Recording System
//!
//! Provides a pluggable `TradeRecorder` trait for recording closed pair trades
//! to various backends:
//! - CSV (backtest artifacts)
//! - Structured tracing events

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::backtest::{Direction, Trade};
use crate::data::AlignedSeries;

/// Error type for trade recording operations
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trade index {index} outside series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Timestamp {0} ms is out of range")]
    InvalidTimestamp(i64),
}

/// A closed pair trade with wall-clock times and symbols attached
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    /// Unique trade identifier
    pub trade_id: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    /// Dependent leg (e.g., "DOT-USD")
    pub symbol_y: String,
    /// Independent leg (e.g., "ADA-USD")
    pub symbol_x: String,
    pub direction: Direction,
    pub entry_y: f64,
    pub entry_x: f64,
    pub exit_y: f64,
    pub exit_x: f64,
    pub entry_hedge_ratio: f64,
    pub exit_hedge_ratio: f64,
    /// Realized PnL per unit of Y
    pub pnl: f64,
}

impl TradeRecord {
    /// Attach timestamps and symbols from `series` to a backtest trade.
    pub fn from_trade(trade: &Trade, series: &AlignedSeries) -> Result<Self, RecordError> {
        let time_at = |index: usize| -> Result<DateTime<Utc>, RecordError> {
            let ms = *series
                .timestamps
                .get(index)
                .ok_or(RecordError::IndexOutOfRange {
                    index,
                    len: series.len(),
                })?;
            DateTime::from_timestamp_millis(ms).ok_or(RecordError::InvalidTimestamp(ms))
        };

        Ok(Self {
            trade_id: uuid::Uuid::new_v4().to_string(),
            entry_time: time_at(trade.entry_index)?,
            exit_time: time_at(trade.exit_index)?,
            symbol_y: series.symbol_y.clone(),
            symbol_x: series.symbol_x.clone(),
            direction: trade.direction,
            entry_y: trade.entry_y,
            entry_x: trade.entry_x,
            exit_y: trade.exit_y,
            exit_x: trade.exit_x,
            entry_hedge_ratio: trade.entry_hedge_ratio,
            exit_hedge_ratio: trade.exit_hedge_ratio,
            pnl: trade.pnl,
        })
    }

    /// Format as CSV line (allocates a new String).
    ///
    /// For larger logs, prefer `write_csv_to()` which writes directly to a
    /// buffer without intermediate allocation.
    pub fn to_csv_line(&self) -> String {
        let mut buf = Vec::with_capacity(192);
        // Writing into a Vec cannot fail
        let _ = self.write_csv_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write CSV line directly to a writer (zero intermediate allocation).
    pub fn write_csv_to<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.trade_id,
            self.entry_time.to_rfc3339(),
            self.exit_time.to_rfc3339(),
            self.symbol_y,
            self.symbol_x,
            self.direction,
            self.entry_y,
            self.entry_x,
            self.exit_y,
            self.exit_x,
            self.entry_hedge_ratio,
            self.exit_hedge_ratio,
            self.pnl,
        )
    }

    /// CSV header
    pub fn csv_header() -> &'static str {
        "trade_id,entry_time,exit_time,symbol_y,symbol_x,direction,entry_y,entry_x,exit_y,exit_x,entry_hedge_ratio,exit_hedge_ratio,pnl"
    }
}

/// Trait for recording trades to various backends
#[async_trait]
pub trait TradeRecorder: Send + Sync {
    /// Record a trade. Implementations should be non-blocking.
    async fn record(&self, trade: &TradeRecord) -> Result<(), RecordError>;

    /// Flush any buffered records (optional, default no-op)
    async fn flush(&self) -> Result<(), RecordError> {
        Ok(())
    }
}

/// A recorder that fans out to multiple backends
pub struct MultiRecorder {
    recorders: Vec<Box<dyn TradeRecorder>>,
}

impl MultiRecorder {
    /// Create a new multi-recorder with the given backends
    pub fn new(recorders: Vec<Box<dyn TradeRecorder>>) -> Self {
        Self { recorders }
    }

    /// Add a recorder
    pub fn add(&mut self, recorder: Box<dyn TradeRecorder>) {
        self.recorders.push(recorder);
    }

    pub fn len(&self) -> usize {
        self.recorders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorders.is_empty()
    }
}

#[async_trait]
impl TradeRecorder for MultiRecorder {
    async fn record(&self, trade: &TradeRecord) -> Result<(), RecordError> {
        let mut error_count = 0;
        let mut last_error = None;

        for recorder in &self.recorders {
            if let Err(e) = recorder.record(trade).await {
                // Best-effort: one failing backend does not stop the others
                tracing::error!(error = %e, "Failed to record trade to backend");
                last_error = Some(e);
                error_count += 1;
            }
        }

        if error_count > 0 && error_count == self.recorders.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), RecordError> {
        for recorder in &self.recorders {
            recorder.flush().await?;
        }
        Ok(())
    }
}
