//! Signal construction: Kalman residual spread and its rolling z-score.

pub mod spread;
pub mod zscore;

pub use spread::compute_spread;
pub use zscore::{rolling_zscore, DEFAULT_WINDOW};
