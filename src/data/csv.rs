//! CSV price loading.
//!
//! Files need a close column and a timestamp column. Timestamps may be epoch
//! seconds, epoch milliseconds or date/datetime strings; all are normalized
//! to epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use super::{PricePoint, PriceSeries};
use crate::error::{PipelineError, Result};

/// Accepted names of the timestamp column, in lookup order
pub const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "time", "date", "start"];

/// Name of the price column
pub const PRICE_COLUMN: &str = "close";

/// Integer timestamps below this are taken as epoch seconds
const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Load one symbol's close prices from a CSV file.
///
/// Rows with an unparseable timestamp or a missing close are skipped.
pub fn load_price_csv(path: impl AsRef<Path>, symbol: &str) -> Result<PriceSeries> {
    let path = path.as_ref();
    info!(path = %path.display(), symbol = %symbol, "Loading CSV data");

    let file = File::open(path)?;
    let df = CsvReader::new(file).finish()?;
    let series = price_series_from_frame(&df, symbol)?;

    info!(
        symbol = %symbol,
        rows = df.height(),
        points = series.len(),
        "CSV data loaded"
    );
    Ok(series)
}

/// Extract a [`PriceSeries`] from an already loaded frame.
pub fn price_series_from_frame(df: &DataFrame, symbol: &str) -> Result<PriceSeries> {
    let ts_column = TIMESTAMP_COLUMNS
        .iter()
        .find_map(|name| df.column(name).ok())
        .ok_or_else(|| {
            PipelineError::InvalidInput(format!(
                "no timestamp column found for {} (expected one of {:?})",
                symbol, TIMESTAMP_COLUMNS
            ))
        })?;

    let close = df
        .column(PRICE_COLUMN)
        .map_err(|_| {
            PipelineError::InvalidInput(format!(
                "no '{}' column found for {}",
                PRICE_COLUMN, symbol
            ))
        })?
        .cast(&DataType::Float64)?;

    let timestamps = parse_timestamps(ts_column)?;
    let closes = close.f64()?;

    let mut skipped = 0usize;
    let points: Vec<PricePoint> = timestamps
        .into_iter()
        .zip(closes.into_iter())
        .filter_map(|(ts, price)| match (ts, price) {
            (Some(timestamp), Some(price)) => Some(PricePoint { timestamp, price }),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        debug!(symbol = %symbol, skipped, "Skipped incomplete CSV rows");
    }

    if points.is_empty() {
        return Err(PipelineError::InsufficientData {
            expected: 1,
            actual: 0,
        });
    }

    Ok(PriceSeries::new(symbol, points))
}

fn parse_timestamps(column: &Series) -> Result<Vec<Option<i64>>> {
    if matches!(column.dtype(), DataType::String) {
        return Ok(column.str()?.into_iter().map(|v| v.and_then(parse_datetime)).collect());
    }

    let as_int = column.cast(&DataType::Int64)?;
    Ok(as_int
        .i64()?
        .into_iter()
        .map(|v| v.map(normalize_epoch))
        .collect())
}

fn normalize_epoch(value: i64) -> i64 {
    if value.unsigned_abs() < SECONDS_CUTOFF as u64 {
        value * 1000
    } else {
        value
    }
}

/// Parse a timestamp string into epoch milliseconds.
fn parse_datetime(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(normalize_epoch(v));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
