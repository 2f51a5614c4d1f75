//! Price series and timestamp alignment.
//!
//! Loaders produce one [`PriceSeries`] per symbol; [`AlignedSeries`] is the
//! inner join of two of them on timestamp and is the only input the
//! pipeline accepts.

pub mod csv;
pub mod synthetic;

pub use csv::load_price_csv;
pub use synthetic::{generate_pair, SyntheticPairConfig};

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{PipelineError, Result};

/// One close price at a timestamp (epoch milliseconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: i64,
    pub price: f64,
}

/// Close prices of a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    /// Sorted by timestamp, one point per timestamp
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, sorting by timestamp. On duplicate timestamps the
    /// last point wins.
    pub fn new(symbol: impl Into<String>, points: impl IntoIterator<Item = PricePoint>) -> Self {
        let by_ts: BTreeMap<i64, f64> = points
            .into_iter()
            .map(|p| (p.timestamp, p.price))
            .collect();
        Self {
            symbol: symbol.into(),
            points: by_ts
                .into_iter()
                .map(|(timestamp, price)| PricePoint { timestamp, price })
                .collect(),
        }
    }

    /// Load from a CSV file, see [`load_price_csv`].
    pub fn from_csv(path: impl AsRef<std::path::Path>, symbol: &str) -> Result<Self> {
        load_price_csv(path, symbol)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Two price series sharing one strictly increasing timestamp index.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    /// Dependent leg
    pub symbol_y: String,
    /// Independent leg
    pub symbol_x: String,
    pub timestamps: Vec<i64>,
    pub y: Vec<f64>,
    pub x: Vec<f64>,
}

impl AlignedSeries {
    /// Build from already-aligned vectors.
    ///
    /// Fails with `DimensionMismatch` on unequal lengths and `InvalidInput`
    /// if timestamps are not strictly increasing.
    pub fn new(
        symbol_y: impl Into<String>,
        symbol_x: impl Into<String>,
        timestamps: Vec<i64>,
        y: Vec<f64>,
        x: Vec<f64>,
    ) -> Result<Self> {
        PipelineError::check_len("aligned series (y vs timestamps)", timestamps.len(), y.len())?;
        PipelineError::check_len("aligned series (x vs timestamps)", timestamps.len(), x.len())?;

        if let Some(pos) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PipelineError::InvalidInput(format!(
                "timestamps must be strictly increasing (index {}: {} -> {})",
                pos + 1,
                timestamps[pos],
                timestamps[pos + 1]
            )));
        }

        Ok(Self {
            symbol_y: symbol_y.into(),
            symbol_x: symbol_x.into(),
            timestamps,
            y,
            x,
        })
    }

    /// Keep only timestamps present in both series.
    pub fn inner_join(y: &PriceSeries, x: &PriceSeries) -> Result<Self> {
        let x_by_ts: BTreeMap<i64, f64> =
            x.points.iter().map(|p| (p.timestamp, p.price)).collect();
        let y_by_ts: BTreeMap<i64, f64> =
            y.points.iter().map(|p| (p.timestamp, p.price)).collect();

        let mut timestamps = Vec::with_capacity(y_by_ts.len().min(x_by_ts.len()));
        let mut ys = Vec::with_capacity(timestamps.capacity());
        let mut xs = Vec::with_capacity(timestamps.capacity());

        for (ts, py) in &y_by_ts {
            if let Some(px) = x_by_ts.get(ts) {
                timestamps.push(*ts);
                ys.push(*py);
                xs.push(*px);
            }
        }

        if timestamps.is_empty() {
            return Err(PipelineError::InsufficientData {
                expected: 1,
                actual: 0,
            });
        }

        let aligned = Self::new(y.symbol.clone(), x.symbol.clone(), timestamps, ys, xs)?;

        let (start, end) = aligned.date_range().unzip();
        info!(
            y = %aligned.symbol_y,
            x = %aligned.symbol_x,
            y_points = y.len(),
            x_points = x.len(),
            merged = aligned.len(),
            start = ?start,
            end = ?end,
            "Series aligned on common timestamps"
        );

        Ok(aligned)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The two price columns `[y, x]`, as handed to a cointegration test.
    pub fn columns(&self) -> Vec<Vec<f64>> {
        vec![self.y.clone(), self.x.clone()]
    }

    /// First and last timestamp as UTC datetimes.
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = DateTime::from_timestamp_millis(*self.timestamps.first()?)?;
        let last = DateTime::from_timestamp_millis(*self.timestamps.last()?)?;
        Some((first, last))
    }
}
