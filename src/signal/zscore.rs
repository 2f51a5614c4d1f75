//! Rolling z-score normalization of the spread.
//!
//! `z[t] = (s[t] - mean(s[t-W+1..=t])) / std(s[t-W+1..=t])` with the sample
//! (N-1) standard deviation. Positions without a full window, windows with
//! zero variance and windows containing non-finite values all yield `NaN`;
//! downstream consumers skip those bars.

use crate::error::{PipelineError, Result};

/// Default rolling window (bars)
pub const DEFAULT_WINDOW: usize = 20;

/// Rolling z-score of `spread` over a trailing window of `window` bars.
///
/// Output has the same length as the input. Never fails on degenerate
/// statistics; only `window == 0` is rejected.
pub fn rolling_zscore(spread: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(PipelineError::InvalidInput(
            "z-score window must be at least 1".to_string(),
        ));
    }

    let mut zscores = vec![f64::NAN; spread.len()];
    if window < 2 || spread.len() < window {
        // Sample std is undefined for a single observation
        return Ok(zscores);
    }

    for end in (window - 1)..spread.len() {
        let slice = &spread[end + 1 - window..=end];
        zscores[end] = window_zscore(slice);
    }

    Ok(zscores)
}

/// z-score of the last element of `slice` relative to the whole slice.
fn window_zscore(slice: &[f64]) -> f64 {
    if slice.iter().any(|v| !v.is_finite()) {
        return f64::NAN;
    }

    // Exactly constant window: 0/0
    let first = slice[0];
    if slice.iter().all(|v| *v == first) {
        return f64::NAN;
    }

    let n = slice.len() as f64;
    let mean = slice.iter().sum::<f64>() / n;
    let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return f64::NAN;
    }

    let current = slice[slice.len() - 1];
    (current - mean) / std_dev
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zscore_constant_prefix_is_nan() {
        let z = rolling_zscore(&[1.0, 1.0, 1.0, 1.0, 5.0], 3).unwrap();
        assert_eq!(z.len(), 5);
        // Warm-up
        assert!(z[0].is_nan());
        assert!(z[1].is_nan());
        // Zero-variance windows are NaN, not zero
        assert!(z[2].is_nan());
        assert!(z[3].is_nan());
        // [1, 1, 5]: mean 7/3, sample std sqrt(16/3)
        let expected = (5.0 - 7.0 / 3.0) / (16.0f64 / 3.0).sqrt();
        assert!((z[4] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zscore_window_one_all_nan() {
        let z = rolling_zscore(&[1.0, 2.0, 3.0, 4.0], 1).unwrap();
        assert_eq!(z.len(), 4);
        assert!(z.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_zscore_window_zero_rejected() {
        assert!(matches!(
            rolling_zscore(&[1.0, 2.0], 0),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zscore_shorter_than_window() {
        let z = rolling_zscore(&[1.0, 2.0, 3.0], 20).unwrap();
        assert_eq!(z.len(), 3);
        assert!(z.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_zscore_known_values() {
        // Window [1, 2, 3]: mean 2, sample std 1
        let z = rolling_zscore(&[1.0, 2.0, 3.0, 0.0], 3).unwrap();
        assert!((z[2] - 1.0).abs() < 1e-12);
        // Window [2, 3, 0]: mean 5/3, sample std sqrt(7/3)
        let expected = (0.0 - 5.0 / 3.0) / (7.0f64 / 3.0).sqrt();
        assert!((z[3] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zscore_nan_in_window_propagates() {
        let z = rolling_zscore(&[1.0, f64::NAN, 3.0, 4.0, 6.0, 2.0], 3).unwrap();
        assert!(z[2].is_nan());
        assert!(z[3].is_nan());
        assert!(z[4].is_finite());
        assert!(z[5].is_finite());
    }
}
