//! Deterministic synthetic pair data for offline runs and tests.
//!
//! X is a geometric random walk; Y is `beta * X + alpha + e` where `e` is an
//! AR(1) residual, so the generated pair is cointegrated by construction.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::AlignedSeries;
use crate::error::Result;

/// Epoch milliseconds of the first synthetic bar (2020-09-13 12:26:40 UTC)
const START_TIMESTAMP_MS: i64 = 1_600_000_000_000;

/// One hour in milliseconds
const BAR_INTERVAL_MS: i64 = 3_600_000;

/// Shape of the generated pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPairConfig {
    /// True hedge ratio
    pub beta: f64,
    /// True intercept
    pub alpha: f64,
    pub start_price: f64,
    /// Per-bar relative volatility of X
    pub volatility: f64,
    /// AR(1) coefficient of the residual, in [0, 1)
    pub reversion: f64,
    /// Scale of the residual innovations
    pub noise: f64,
}

impl Default for SyntheticPairConfig {
    fn default() -> Self {
        Self {
            beta: 1.5,
            alpha: 10.0,
            start_price: 100.0,
            volatility: 0.01,
            reversion: 0.5,
            noise: 1.0,
        }
    }
}

/// Linear congruential generator yielding uniform values in [-0.5, 0.5).
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((self.0 >> 11) as f64) / ((1u64 << 53) as f64) - 0.5
    }
}

/// Generate `len` hourly bars of a cointegrated pair.
///
/// The same seed always yields the same series.
pub fn generate_pair(seed: u64, len: usize, config: &SyntheticPairConfig) -> Result<AlignedSeries> {
    info!(
        seed,
        candles = len,
        beta = config.beta,
        alpha = config.alpha,
        "Generating synthetic pair"
    );

    let mut rng = Lcg(seed);
    let mut price = config.start_price;
    let mut residual = 0.0_f64;

    let mut timestamps = Vec::with_capacity(len);
    let mut ys = Vec::with_capacity(len);
    let mut xs = Vec::with_capacity(len);

    for i in 0..len {
        price *= 1.0 + config.volatility * rng.next();
        price = price.max(1.0); // Floor at $1
        residual = config.reversion * residual + config.noise * rng.next();

        timestamps.push(START_TIMESTAMP_MS + i as i64 * BAR_INTERVAL_MS);
        xs.push(price);
        ys.push(config.beta * price + config.alpha + residual);
    }

    AlignedSeries::new("SYN-Y", "SYN-X", timestamps, ys, xs)
}
