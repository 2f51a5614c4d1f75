//! Statistical primitives for pair analysis
//!
//! Correlation, static OLS fit, mean-reversion half-life and the
//! Dickey-Fuller regression used by the Engle-Granger test.

use serde::Serialize;
use tracing::warn;

/// Maximum safe price ratio for correlation calculations.
/// Beyond this ratio, f64 precision loss may affect results
const MAX_PRICE_RATIO: f64 = 1e9;

/// Calculate Pearson correlation coefficient between two price series
///
/// Returns a value in [-1.0, 1.0], or None if calculation fails.
/// Returns None if the mean price ratio exceeds MAX_PRICE_RATIO.
///
/// # Mathematical Definition
/// r = Σ[(xi - x̄)(yi - ȳ)] / √[Σ(xi - x̄)² × Σ(yi - ȳ)²]
pub fn calculate_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }

    let mean_a: f64 = a.iter().sum::<f64>() / a.len() as f64;
    let mean_b: f64 = b.iter().sum::<f64>() / b.len() as f64;

    if mean_b != 0.0 {
        let ratio = (mean_a / mean_b).abs();
        if !(1.0 / MAX_PRICE_RATIO..=MAX_PRICE_RATIO).contains(&ratio) {
            warn!(
                ratio = format!("{:.2e}", ratio),
                limit = format!("{:.2e}", MAX_PRICE_RATIO),
                "Price ratio exceeds safe bounds for correlation calculation"
            );
            return None;
        }
    }

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Some(0.0);
    }

    let correlation = covariance / (var_a.sqrt() * var_b.sqrt());

    if correlation.is_finite() {
        Some(correlation)
    } else {
        None
    }
}

/// Static least-squares fit `y ≈ slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OlsFit {
    pub slope: f64,
    pub intercept: f64,
}

impl OlsFit {
    pub fn residuals(&self, y: &[f64], x: &[f64]) -> Vec<f64> {
        y.iter()
            .zip(x)
            .map(|(y, x)| y - (self.slope * x + self.intercept))
            .collect()
    }
}

/// Ordinary least squares of `y` on `x` with a constant.
///
/// Returns None for fewer than two points or a constant `x`.
pub fn ols(y: &[f64], x: &[f64]) -> Option<OlsFit> {
    if y.len() != x.len() || y.len() < 2 {
        return None;
    }
    let n = y.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        sxy += dx * (yi - mean_y);
        sxx += dx * dx;
    }

    if sxx.abs() < f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let fit = OlsFit {
        slope,
        intercept: mean_y - slope * mean_x,
    };
    (fit.slope.is_finite() && fit.intercept.is_finite()).then_some(fit)
}

/// Analyze a spread for mean-reversion characteristics
///
/// Returns `(std_dev, half_life_bars)` based on an Ornstein-Uhlenbeck model.
/// The half-life is None when the spread does not mean-revert.
///
/// # Half-Life Estimation
/// Uses lag-1 autocorrelation to estimate the speed of mean reversion:
/// ρ = autocorrelation
/// half_life = -ln(2) / ln(ρ)
pub fn analyze_spread(spread: &[f64]) -> (f64, Option<f64>) {
    if spread.len() < 3 {
        return (0.0, None);
    }

    let n = spread.len() as f64;
    let mean = spread.iter().sum::<f64>() / n;

    // Population variance
    let variance = spread.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for w in spread.windows(2) {
        let dx = w[0] - mean;
        let dy = w[1] - mean;
        numerator += dx * dy;
        denominator += dx * dx;
    }

    let rho = if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    };

    let half_life = (rho > 0.0 && rho < 1.0).then(|| -2.0f64.ln() / rho.ln());

    (std_dev, half_life)
}

/// Dickey-Fuller t-statistic of a series (lag 0, with constant).
///
/// Regresses Δs[t] on s[t-1]; a more negative statistic is stronger
/// evidence against a unit root. Returns None for degenerate input
/// (fewer than 3 points, constant series, zero residual variance).
///
/// # Mathematical Foundation
/// Under H0 (unit root): s[t] = s[t-1] + ε
/// Under H1 (stationary): s[t] = ρ*s[t-1] + ε where |ρ| < 1
///
/// We test: Δs[t] = c + γ*s[t-1] + ε where γ = ρ - 1
pub fn dickey_fuller_statistic(series: &[f64]) -> Option<f64> {
    if series.len() < 3 {
        return None;
    }

    let n = series.len() - 1;
    let n_f64 = n as f64;

    let delta: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let lagged = &series[..n];

    let lag_mean = lagged.iter().sum::<f64>() / n_f64;
    let delta_mean = delta.iter().sum::<f64>() / n_f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (l, d) in lagged.iter().zip(&delta) {
        let l_centered = l - lag_mean;
        numerator += l_centered * (d - delta_mean);
        denominator += l_centered * l_centered;
    }

    if denominator.abs() < f64::EPSILON {
        return None;
    }

    let gamma = numerator / denominator;

    let sse: f64 = lagged
        .iter()
        .zip(&delta)
        .map(|(l, d)| {
            let predicted = gamma * (l - lag_mean) + delta_mean;
            (d - predicted).powi(2)
        })
        .sum();

    // Two estimated parameters: constant and γ
    let mse = sse / (n_f64 - 2.0).max(1.0);
    let se_gamma = (mse / denominator).sqrt();

    if !se_gamma.is_finite() || se_gamma.abs() < f64::EPSILON {
        return None;
    }

    let t_statistic = gamma / se_gamma;
    t_statistic.is_finite().then_some(t_statistic)
}
