//! Kalman-filter pairs trading research pipeline.
//!
//! A dynamic hedge ratio and intercept are estimated online with a Kalman
//! filter, the residual spread is normalized with a rolling z-score, and a
//! threshold strategy trades its mean reversion.

pub mod backtest;
pub mod cli;
pub mod cointegration;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod math;
pub mod pipeline;
pub mod signal;

pub use error::{PipelineError, Result};
