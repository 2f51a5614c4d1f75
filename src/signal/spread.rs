//! Residual spread between the dependent leg and its filtered linear fit.

use crate::error::{PipelineError, Result};

/// Compute `spread[t] = y[t] - (hedge_ratio[t] * x[t] + intercept[t])`.
///
/// Purely elementwise: each output depends only on the inputs at the same
/// index. All four inputs must have the same length; otherwise this fails
/// with `DimensionMismatch` and produces nothing.
pub fn compute_spread(
    y: &[f64],
    x: &[f64],
    hedge_ratio: &[f64],
    intercept: &[f64],
) -> Result<Vec<f64>> {
    let n = y.len();
    PipelineError::check_len("spread (x vs y)", n, x.len())?;
    PipelineError::check_len("spread (hedge ratio vs y)", n, hedge_ratio.len())?;
    PipelineError::check_len("spread (intercept vs y)", n, intercept.len())?;

    Ok(y.iter()
        .zip(x)
        .zip(hedge_ratio.iter().zip(intercept))
        .map(|((y, x), (hr, alpha))| y - (hr * x + alpha))
        .collect())
}
