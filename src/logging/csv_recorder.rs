//! CSV Trade Recorder
//!
//! Appends closed pair trades to a CSV file.

use super::recorder::{RecordError, TradeRecord, TradeRecorder};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// CSV file recorder
///
/// Uses `spawn_blocking` to avoid blocking the async runtime during file I/O.
pub struct CsvRecorder {
    file_path: Arc<PathBuf>,
    /// Mutex to serialize writes and track header state
    state: Arc<Mutex<CsvState>>,
}

struct CsvState {
    header_written: bool,
}

impl CsvRecorder {
    /// Create a recorder that appends to `file_path`, writing the header
    /// only if the file is missing or empty.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path: Arc::new(file_path),
            state: Arc::new(Mutex::new(CsvState {
                header_written: false,
            })),
        }
    }

    /// Create a recorder over a fresh file, truncating any previous run.
    pub fn truncate(file_path: PathBuf) -> Result<Self, RecordError> {
        let mut file = File::create(&file_path)?;
        writeln!(file, "{}", TradeRecord::csv_header())?;
        Ok(Self {
            file_path: Arc::new(file_path),
            state: Arc::new(Mutex::new(CsvState {
                header_written: true,
            })),
        })
    }
}

#[async_trait]
impl TradeRecorder for CsvRecorder {
    async fn record(&self, trade: &TradeRecord) -> Result<(), RecordError> {
        let file_path = Arc::clone(&self.file_path);
        let state = Arc::clone(&self.state);
        let csv_line = trade.to_csv_line();

        tokio::task::spawn_blocking(move || {
            // Handle mutex poisoning gracefully
            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());

            if !guard.header_written {
                let needs_header = std::fs::metadata(&*file_path)
                    .map(|m| m.len() == 0)
                    .unwrap_or(true);

                if needs_header {
                    let mut file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&*file_path)?;
                    writeln!(file, "{}", TradeRecord::csv_header())?;
                }
                guard.header_written = true;
            }

            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&*file_path)?;
            writeln!(file, "{}", csv_line)?;

            Ok::<(), RecordError>(())
        })
        .await
        .map_err(|e| RecordError::Io(std::io::Error::other(e)))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::{Direction, Trade};
    use crate::data::AlignedSeries;
    use tempfile::tempdir;

    fn record(pnl: f64) -> TradeRecord {
        let series = AlignedSeries::new(
            "BTC-USD",
            "ETH-USD",
            vec![1_700_000_000_000, 1_700_000_060_000],
            vec![35_000.0, 35_100.0],
            vec![2_000.0, 2_010.0],
        )
        .unwrap();
        let trade = Trade {
            direction: Direction::LongSpread,
            entry_index: 0,
            exit_index: 1,
            entry_y: 35_000.0,
            entry_x: 2_000.0,
            exit_y: 35_100.0,
            exit_x: 2_010.0,
            entry_hedge_ratio: 17.0,
            exit_hedge_ratio: 17.0,
            pnl,
        };
        TradeRecord::from_trade(&trade, &series).unwrap()
    }

    #[tokio::test]
    async fn test_csv_recorder_writes_header_and_records() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_trades.csv");

        let recorder = CsvRecorder::new(file_path.clone());
        recorder.record(&record(-70.0)).await.unwrap();
        recorder.record(&record(f64::NAN)).await.unwrap();

        let contents = std::fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("trade_id,entry_time"));
        assert!(lines[1].contains("BTC-USD"));
        assert!(lines[1].ends_with(",-70"));
        assert!(lines[2].ends_with(",NaN"));
    }

    #[tokio::test]
    async fn test_csv_recorder_appends_without_second_header() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("trades.csv");

        CsvRecorder::new(file_path.clone())
            .record(&record(1.0))
            .await
            .unwrap();
        CsvRecorder::new(file_path.clone())
            .record(&record(2.0))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&file_path).unwrap();
        assert_eq!(contents.matches("trade_id,").count(), 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_truncate_starts_fresh() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("trades.csv");
        std::fs::write(&file_path, "stale\n").unwrap();

        let recorder = CsvRecorder::truncate(file_path.clone()).unwrap();
        recorder.record(&record(1.0)).await.unwrap();

        let contents = std::fs::read_to_string(&file_path).unwrap();
        assert!(!contents.contains("stale"));
        assert_eq!(contents.lines().count(), 2);
    }
}
