//! Tracing-based Trade Recorder
//!
//! Emits one structured event per closed trade on the `trades` target, so a
//! JSON subscriber turns the trade log into machine-readable lines.

use super::recorder::{RecordError, TradeRecord, TradeRecorder};
use async_trait::async_trait;
use tracing::info;

/// Recorder that emits structured tracing logs
pub struct TracingRecorder;

impl TracingRecorder {
    /// Create a new tracing recorder
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeRecorder for TracingRecorder {
    async fn record(&self, trade: &TradeRecord) -> Result<(), RecordError> {
        info!(
            target: "trades",
            trade_type = "CLOSED",
            trade_id = %trade.trade_id,
            entry_time = %trade.entry_time.to_rfc3339(),
            exit_time = %trade.exit_time.to_rfc3339(),
            pair = %format!("{}/{}", trade.symbol_y, trade.symbol_x),
            direction = %trade.direction,
            entry_hedge_ratio = trade.entry_hedge_ratio,
            exit_hedge_ratio = trade.exit_hedge_ratio,
            pnl = trade.pnl,
            "Trade closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::{Direction, Trade};
    use crate::data::AlignedSeries;

    #[tokio::test]
    async fn test_tracing_recorder_does_not_error() {
        let recorder = TracingRecorder::new();
        let series =
            AlignedSeries::new("ETH-USD", "BTC-USD", vec![0, 1], vec![1.0, 1.0], vec![1.0, 1.0])
                .unwrap();
        let trade = Trade {
            direction: Direction::ShortSpread,
            entry_index: 0,
            exit_index: 1,
            entry_y: 1.0,
            entry_x: 1.0,
            exit_y: 1.0,
            exit_x: 1.0,
            entry_hedge_ratio: 1.0,
            exit_hedge_ratio: 1.0,
            pnl: 0.0,
        };

        let record = TradeRecord::from_trade(&trade, &series).unwrap();
        recorder.record(&record).await.unwrap();
    }
}
