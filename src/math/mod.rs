//! Mathematical utilities for the pairs pipeline.
//!
//! This module provides the recursive state estimator used to track a
//! drifting hedge ratio and intercept between two assets.

pub mod kalman;

pub use kalman::{KalmanConfig, KalmanHedgeRatio, KalmanOutput};
