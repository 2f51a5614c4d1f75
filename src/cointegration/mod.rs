//! Cointegration gate for a candidate pair.
//!
//! The pipeline only consumes a verdict, a test statistic and a critical
//! value, so the test sits behind the [`CointegrationTest`] trait. The crate
//! ships an Engle-Granger implementation: static OLS of the first column on
//! the second, then a Dickey-Fuller test on the residuals.

pub mod stats;

pub use stats::{analyze_spread, calculate_correlation, dickey_fuller_statistic, ols, OlsFit};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

/// Below this many observations the residual test is not run
pub const MIN_OBSERVATIONS: usize = 20;

/// Engle-Granger critical values for two variables with a constant
/// (MacKinnon, 2010): 10%, 5%, 1%
const ENGLE_GRANGER_CRITICAL_VALUES: [f64; 3] = [-3.04, -3.34, -3.90];

/// Significance level of the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Significance {
    #[serde(rename = "0.10")]
    TenPercent,
    #[default]
    #[serde(rename = "0.05")]
    FivePercent,
    #[serde(rename = "0.01")]
    OnePercent,
}

impl Significance {
    /// Column into a `[10%, 5%, 1%]` critical value table.
    pub fn index(&self) -> usize {
        match self {
            Significance::TenPercent => 0,
            Significance::FivePercent => 1,
            Significance::OnePercent => 2,
        }
    }

    /// Confidence level in percent (90, 95, 99).
    pub fn confidence_pct(&self) -> u32 {
        match self {
            Significance::TenPercent => 90,
            Significance::FivePercent => 95,
            Significance::OnePercent => 99,
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.confidence_pct())
    }
}

impl FromStr for Significance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().trim_end_matches('%') {
            "0.10" | "0.1" | "10" => Ok(Self::TenPercent),
            "0.05" | "5" => Ok(Self::FivePercent),
            "0.01" | "1" => Ok(Self::OnePercent),
            other => Err(format!(
                "Unknown significance level: '{}'. Use 0.10, 0.05 or 0.01",
                other
            )),
        }
    }
}

/// Verdict of a cointegration test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CointegrationResult {
    pub cointegrated: bool,
    /// Test statistic (meaning depends on the test)
    pub statistic: f64,
    /// Critical value at the requested significance
    pub critical_value: f64,
    pub significance: Significance,
    /// Name of the test that produced the verdict
    pub method: String,
}

/// A cointegration hypothesis test over a two-column price matrix.
pub trait CointegrationTest {
    /// Test `columns` (dependent first, independent second).
    ///
    /// Must fail with `InvalidInput` unless there are exactly two columns.
    fn test(&self, columns: &[Vec<f64>]) -> Result<CointegrationResult>;
}

/// Engle-Granger two-step residual test.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngleGranger {
    pub significance: Significance,
}

impl EngleGranger {
    pub const METHOD: &'static str = "engle-granger";

    pub fn new(significance: Significance) -> Self {
        Self { significance }
    }

    fn verdict(&self, statistic: f64, cointegrated: bool) -> CointegrationResult {
        CointegrationResult {
            cointegrated,
            statistic,
            critical_value: ENGLE_GRANGER_CRITICAL_VALUES[self.significance.index()],
            significance: self.significance,
            method: Self::METHOD.to_string(),
        }
    }
}

impl CointegrationTest for EngleGranger {
    fn test(&self, columns: &[Vec<f64>]) -> Result<CointegrationResult> {
        if columns.len() != 2 {
            return Err(PipelineError::InvalidInput(format!(
                "prices must have exactly 2 columns, got {}",
                columns.len()
            )));
        }
        let (y, x) = (&columns[0], &columns[1]);
        PipelineError::check_len("cointegration (x vs y)", y.len(), x.len())?;

        let (y, x): (Vec<f64>, Vec<f64>) = y
            .iter()
            .zip(x)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(a, b)| (*a, *b))
            .unzip();

        if y.len() < MIN_OBSERVATIONS {
            warn!(
                observations = y.len(),
                required = MIN_OBSERVATIONS,
                "Too few observations for cointegration test"
            );
            return Ok(self.verdict(0.0, false));
        }

        let Some(fit) = ols(&y, &x) else {
            warn!("Degenerate regression (constant independent series)");
            return Ok(self.verdict(0.0, false));
        };

        let residuals = fit.residuals(&y, &x);
        let Some(statistic) = dickey_fuller_statistic(&residuals) else {
            return Ok(self.verdict(0.0, false));
        };

        let result = self.verdict(statistic, false);
        let cointegrated = statistic < result.critical_value;

        info!(
            statistic = format!("{:.2}", statistic),
            critical = format!("{:.2}", result.critical_value),
            confidence = %self.significance,
            hedge = format!("{:.4}", fit.slope),
            "Engle-Granger test: {}",
            if cointegrated { "Cointegrated" } else { "Not cointegrated" }
        );

        Ok(CointegrationResult {
            cointegrated,
            ..result
        })
    }
}

/// Descriptive statistics of a pair, reported alongside the backtest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairDiagnostics {
    pub correlation: Option<f64>,
    /// Static OLS fit of Y on X over the whole sample
    pub ols: Option<OlsFit>,
    /// Population std of the static OLS residual
    pub residual_std: f64,
    /// Mean-reversion half-life of the static residual, in bars
    pub half_life_bars: Option<f64>,
}

impl PairDiagnostics {
    pub fn compute(y: &[f64], x: &[f64]) -> Self {
        let correlation = calculate_correlation(y, x);
        let fit = ols(y, x);
        let (residual_std, half_life_bars) = match fit {
            Some(fit) => analyze_spread(&fit.residuals(y, x)),
            None => (0.0, None),
        };
        Self {
            correlation,
            ols: fit,
            residual_std,
            half_life_bars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate_pair, SyntheticPairConfig};

    fn cointegrated_pair(n: usize) -> (Vec<f64>, Vec<f64>) {
        let pair = generate_pair(11, n, &SyntheticPairConfig::default()).unwrap();
        (pair.y, pair.x)
    }

    #[test]
    fn test_requires_two_columns() {
        let test = EngleGranger::default();
        let three = vec![vec![1.0; 30], vec![2.0; 30], vec![3.0; 30]];
        assert!(matches!(
            test.test(&three),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            test.test(&[vec![1.0; 30]]),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_column_length_mismatch() {
        let err = EngleGranger::default()
            .test(&[vec![1.0; 30], vec![1.0; 29]])
            .unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_detects_cointegrated_pair() {
        let (y, x) = cointegrated_pair(500);
        let result = EngleGranger::default().test(&[y, x]).unwrap();
        assert!(result.cointegrated, "statistic {}", result.statistic);
        assert_eq!(result.critical_value, -3.34);
        assert_eq!(result.method, EngleGranger::METHOD);
    }

    #[test]
    fn test_too_few_observations() {
        let (y, x) = cointegrated_pair(10);
        let result = EngleGranger::default().test(&[y, x]).unwrap();
        assert!(!result.cointegrated);
        assert_eq!(result.statistic, 0.0);
    }

    #[test]
    fn test_significance_selects_critical_value() {
        let (y, x) = cointegrated_pair(200);
        let columns = vec![y, x];
        let one = EngleGranger::new(Significance::OnePercent).test(&columns).unwrap();
        let ten = EngleGranger::new(Significance::TenPercent).test(&columns).unwrap();
        assert_eq!(one.critical_value, -3.90);
        assert_eq!(ten.critical_value, -3.04);
        assert_eq!(one.statistic, ten.statistic);
    }

    #[test]
    fn test_significance_parsing() {
        assert_eq!("0.05".parse::<Significance>().unwrap(), Significance::FivePercent);
        assert_eq!("10%".parse::<Significance>().unwrap(), Significance::TenPercent);
        assert_eq!("0.01".parse::<Significance>().unwrap(), Significance::OnePercent);
        assert!("0.2".parse::<Significance>().is_err());
        assert_eq!(Significance::default().to_string(), "95%");
    }

    #[test]
    fn test_diagnostics() {
        let (y, x) = cointegrated_pair(300);
        let diag = PairDiagnostics::compute(&y, &x);
        assert!(diag.correlation.unwrap() > 0.9);
        assert!((diag.ols.unwrap().slope - 1.5).abs() < 0.1);
        assert!(diag.half_life_bars.is_some());
    }
}
