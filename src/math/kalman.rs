//! Kalman Filter for dynamic hedge ratio and intercept estimation.
//!
//! Tracks the linear relationship between two assets in a pairs trading
//! strategy as a two-dimensional latent state `[β, α]` (slope, intercept).
//! Each new price pair is folded in with one predict/update cycle, so the
//! estimate at step `t` only ever sees observations up to and including `t`.
//!
//! # Mathematical Model
//!
//! **State equation** (random walk):
//! ```text
//! θ[t] = θ[t-1] + w,  where w ~ N(0, Q·I₂),  θ = [β, α]ᵀ
//! ```
//!
//! **Observation equation**:
//! ```text
//! y[t] = [x[t], 1] · θ[t] + v,  where v ~ N(0, R)
//! ```
//!
//! Where:
//! - `y[t]` is the dependent asset price
//! - `x[t]` is the independent asset price
//! - `Q = δ / (1 - δ)` is process noise (how fast β and α drift)
//! - `R` is observation noise (measurement uncertainty)
//!
//! The prior is `θ = [0, 0]` with covariance `I₂`. The first observation is
//! applied directly to the prior; process noise is added before every later
//! observation.
//!
//! # Usage
//!
//! ```rust
//! use kalman_pairs::math::KalmanHedgeRatio;
//!
//! let mut kalman = KalmanHedgeRatio::default_for_pairs();
//!
//! // Update with each new price pair
//! let (beta, alpha) = kalman.update(100.0, 98.5); // x=100, y=98.5
//! println!("hedge ratio {beta}, intercept {alpha}");
//! ```
//!
//! # References
//!
//! - Chan, E. (2013). "Algorithmic Trading: Winning Strategies and Their Rationale"
//! - Bucy, R.S. & Joseph, P.D. (1968). "Filtering for Stochastic Processes"

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

type Mat2 = [[f64; 2]; 2];

const IDENTITY: Mat2 = [[1.0, 0.0], [0.0, 1.0]];

/// Noise parameters for [`KalmanHedgeRatio`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KalmanConfig {
    /// Drift rate δ. Process noise is `δ / (1 - δ)` on both state components.
    #[serde(default = "default_delta")]
    pub delta: f64,
    /// Observation noise variance R
    #[serde(default = "default_observation_variance")]
    pub observation_variance: f64,
}

fn default_delta() -> f64 {
    1e-5
}
fn default_observation_variance() -> f64 {
    1.0
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            delta: default_delta(),
            observation_variance: default_observation_variance(),
        }
    }
}

impl KalmanConfig {
    /// Process noise variance added to each state component per step.
    pub fn process_noise(&self) -> f64 {
        self.delta / (1.0 - self.delta)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(format!("delta must be in (0, 1), got {}", self.delta));
        }
        if !(self.observation_variance > 0.0 && self.observation_variance.is_finite()) {
            return Err(format!(
                "observation_variance must be positive, got {}",
                self.observation_variance
            ));
        }
        Ok(())
    }
}

/// Per-step filtered estimates, one entry per input observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KalmanOutput {
    pub hedge_ratio: Vec<f64>,
    pub intercept: Vec<f64>,
}

impl KalmanOutput {
    pub fn len(&self) -> usize {
        self.hedge_ratio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hedge_ratio.is_empty()
    }
}

/// Kalman Filter for estimating a dynamic hedge ratio and intercept.
///
/// # Performance
///
/// - O(1) per update, closed-form 2×2 algebra, no historical data storage
/// - Suitable for tick-by-tick updates
#[derive(Debug, Clone)]
pub struct KalmanHedgeRatio {
    /// Current estimate `[β, α]`
    state: [f64; 2],
    /// State estimation error covariance (P)
    covariance: Mat2,
    /// Process noise variance (Q) per state component
    process_noise: f64,
    /// Observation noise variance (R)
    obs_noise: f64,
    /// Whether the first observation has been consumed (controls the predict step)
    primed: bool,
    /// Number of observations folded into the state
    update_count: u64,
}

impl KalmanHedgeRatio {
    /// Create a new filter from its noise parameters.
    ///
    /// # Arguments
    ///
    /// * `delta` - Drift rate δ in (0, 1). Larger values adapt faster but
    ///   produce noisier estimates.
    /// * `obs_noise` - R parameter, observation noise variance.
    pub fn new(delta: f64, obs_noise: f64) -> Self {
        Self {
            state: [0.0, 0.0],
            covariance: IDENTITY,
            process_noise: delta / (1.0 - delta),
            obs_noise,
            primed: false,
            update_count: 0,
        }
    }

    /// Create a filter from a validated [`KalmanConfig`].
    pub fn from_config(config: &KalmanConfig) -> Result<Self> {
        config.validate().map_err(PipelineError::InvalidConfig)?;
        Ok(Self::new(config.delta, config.observation_variance))
    }

    /// Create a filter with the pairs-trading defaults: `δ = 1e-5`, `R = 1.0`.
    pub fn default_for_pairs() -> Self {
        let config = KalmanConfig::default();
        Self::new(config.delta, config.observation_variance)
    }

    /// Fold one price pair into the estimate.
    ///
    /// # Arguments
    ///
    /// * `x` - Independent variable price
    /// * `y` - Dependent variable price
    ///
    /// # Returns
    ///
    /// `(β, α)` such that ideally `y ≈ β * x + α`.
    ///
    /// # Missing observations
    ///
    /// A non-finite `x` or `y` is treated as a missing observation: the
    /// covariance is still carried forward through the predict step, but the
    /// state is left unchanged.
    pub fn update(&mut self, x: f64, y: f64) -> (f64, f64) {
        // === PREDICT STEP ===
        // Identity transition: state carries over, covariance widens by Q.
        let mut p = self.covariance;
        if self.primed {
            p[0][0] += self.process_noise;
            p[1][1] += self.process_noise;
        }
        self.primed = true;

        if !x.is_finite() || !y.is_finite() {
            self.covariance = p;
            return self.estimate();
        }

        // === UPDATE STEP ===
        // Observation row H = [x, 1]
        let h = [x, 1.0];

        // P * H'
        let ph = [
            p[0][0] * h[0] + p[0][1] * h[1],
            p[1][0] * h[0] + p[1][1] * h[1],
        ];

        // Innovation covariance: S = H * P * H' + R
        let s = h[0] * ph[0] + h[1] * ph[1] + self.obs_noise;
        if !s.is_finite() || s <= 0.0 {
            self.covariance = p;
            return self.estimate();
        }

        // Innovation (measurement residual): y - H * θ
        let innovation = y - (h[0] * self.state[0] + h[1] * self.state[1]);

        // Kalman gain: K = P * H' / S
        let k = [ph[0] / s, ph[1] / s];

        self.state[0] += k[0] * innovation;
        self.state[1] += k[1] * innovation;

        // Joseph form: P = (I - K H) P (I - K H)' + K R K'
        let a = [
            [1.0 - k[0] * h[0], -k[0] * h[1]],
            [-k[1] * h[0], 1.0 - k[1] * h[1]],
        ];
        let apat = mul_transpose(&mul(&a, &p), &a);
        let mut posterior = [
            [
                apat[0][0] + k[0] * k[0] * self.obs_noise,
                apat[0][1] + k[0] * k[1] * self.obs_noise,
            ],
            [
                apat[1][0] + k[1] * k[0] * self.obs_noise,
                apat[1][1] + k[1] * k[1] * self.obs_noise,
            ],
        ];
        let off_diag = 0.5 * (posterior[0][1] + posterior[1][0]);
        posterior[0][1] = off_diag;
        posterior[1][0] = off_diag;
        self.covariance = posterior;

        self.update_count += 1;
        self.estimate()
    }

    /// Run the filter over a whole aligned pair of series.
    ///
    /// Output vectors have the same length as the input. Fails with
    /// `DimensionMismatch` if `y` and `x` differ in length.
    pub fn filter(&mut self, y: &[f64], x: &[f64]) -> Result<KalmanOutput> {
        PipelineError::check_len("kalman filter (x vs y)", y.len(), x.len())?;

        let mut output = KalmanOutput {
            hedge_ratio: Vec::with_capacity(y.len()),
            intercept: Vec::with_capacity(y.len()),
        };
        for (&yi, &xi) in y.iter().zip(x.iter()) {
            let (beta, alpha) = self.update(xi, yi);
            output.hedge_ratio.push(beta);
            output.intercept.push(alpha);
        }
        Ok(output)
    }

    /// Current `(β, α)` estimate.
    #[inline]
    pub fn estimate(&self) -> (f64, f64) {
        (self.state[0], self.state[1])
    }

    /// Get the current hedge ratio estimate.
    #[inline]
    pub fn get_beta(&self) -> f64 {
        self.state[0]
    }

    /// Get the current intercept estimate.
    #[inline]
    pub fn get_intercept(&self) -> f64 {
        self.state[1]
    }

    /// Get the current state covariance.
    ///
    /// Lower diagonal values indicate higher confidence in the estimate.
    #[inline]
    pub fn get_covariance(&self) -> [[f64; 2]; 2] {
        self.covariance
    }

    /// Get the number of observations folded into the state.
    #[inline]
    pub fn get_update_count(&self) -> u64 {
        self.update_count
    }

    /// Returns `true` after at least `min_updates` observations.
    pub fn is_warmed_up(&self, min_updates: u64) -> bool {
        self.update_count >= min_updates
    }

    /// Reset the filter to its prior.
    pub fn reset(&mut self) {
        self.state = [0.0, 0.0];
        self.covariance = IDENTITY;
        self.primed = false;
        self.update_count = 0;
    }
}

fn mul(a: &Mat2, b: &Mat2) -> Mat2 {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[1][0],
            a[0][0] * b[0][1] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[1][0],
            a[1][0] * b[0][1] + a[1][1] * b[1][1],
        ],
    ]
}

/// `a * b'`
fn mul_transpose(a: &Mat2, b: &Mat2) -> Mat2 {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[0][1],
            a[0][0] * b[1][0] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[0][1],
            a[1][0] * b[1][0] + a[1][1] * b[1][1],
        ],
    ]
}
