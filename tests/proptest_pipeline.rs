//! Property-based tests for the pipeline stages
//!
//! These tests use proptest to verify invariants across many random inputs,
//! catching edge cases that unit tests might miss.

use kalman_pairs::backtest::{nan_safe_sum, StrategyEngine};
use kalman_pairs::math::KalmanHedgeRatio;
use kalman_pairs::signal::{compute_spread, rolling_zscore};
use proptest::prelude::*;

fn prices() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((1.0f64..100.0, 1.0f64..100.0), 1..80)
}

fn zscores() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(prop_oneof![1 => Just(f64::NAN), 6 => -4.0f64..4.0], 1..120)
}

proptest! {
    /// One (hedge ratio, intercept) pair per observation
    #[test]
    fn kalman_output_length_matches_input(pairs in prices()) {
        let (y, x): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let out = KalmanHedgeRatio::default_for_pairs().filter(&y, &x).unwrap();
        prop_assert_eq!(out.hedge_ratio.len(), y.len());
        prop_assert_eq!(out.intercept.len(), y.len());
    }

    /// Estimates at t never depend on observations after t
    #[test]
    fn kalman_has_no_look_ahead(pairs in prices(), cut in 0usize..80) {
        let (y, x): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let k = cut.min(y.len());

        let full = KalmanHedgeRatio::default_for_pairs().filter(&y, &x).unwrap();
        let prefix = KalmanHedgeRatio::default_for_pairs().filter(&y[..k], &x[..k]).unwrap();

        prop_assert_eq!(&full.hedge_ratio[..k], &prefix.hedge_ratio[..]);
        prop_assert_eq!(&full.intercept[..k], &prefix.intercept[..]);
    }

    /// Finite inputs give finite estimates
    #[test]
    fn kalman_estimates_are_finite(pairs in prices()) {
        let (y, x): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let out = KalmanHedgeRatio::default_for_pairs().filter(&y, &x).unwrap();
        prop_assert!(out.hedge_ratio.iter().chain(&out.intercept).all(|v| v.is_finite()));
    }

    /// Reordering timesteps reorders spread outputs the same way
    #[test]
    fn spread_is_elementwise(
        rows in prop::collection::vec((1.0f64..100.0, 1.0f64..100.0, -3.0f64..3.0, -10.0f64..10.0), 1..50)
    ) {
        let y: Vec<f64> = rows.iter().map(|r| r.0).collect();
        let x: Vec<f64> = rows.iter().map(|r| r.1).collect();
        let hr: Vec<f64> = rows.iter().map(|r| r.2).collect();
        let a: Vec<f64> = rows.iter().map(|r| r.3).collect();
        let forward = compute_spread(&y, &x, &hr, &a).unwrap();

        let rev = |v: &[f64]| v.iter().rev().copied().collect::<Vec<f64>>();
        let backward = compute_spread(&rev(&y), &rev(&x), &rev(&hr), &rev(&a)).unwrap();

        prop_assert_eq!(rev(&forward), backward);
    }

    /// Warm-up bars are NaN and the rest are NaN or finite
    #[test]
    fn zscore_shape(
        spread in prop::collection::vec(-50.0f64..50.0, 0..100),
        window in 1usize..30
    ) {
        let z = rolling_zscore(&spread, window).unwrap();
        prop_assert_eq!(z.len(), spread.len());
        for v in z.iter().take(window.saturating_sub(1)) {
            prop_assert!(v.is_nan());
        }
        prop_assert!(z.iter().all(|v| v.is_nan() || v.is_finite()));
        if window == 1 {
            prop_assert!(z.iter().all(|v| v.is_nan()));
        }
    }

    /// A sample z-score is bounded by (n-1)/sqrt(n)
    #[test]
    fn zscore_is_bounded(
        spread in prop::collection::vec(-50.0f64..50.0, 2..60),
        window in 2usize..20
    ) {
        let bound = (window as f64 - 1.0) / (window as f64).sqrt() + 1e-9;
        for v in rolling_zscore(&spread, window).unwrap() {
            if v.is_finite() {
                prop_assert!(v.abs() <= bound, "|z| = {} exceeds {}", v.abs(), bound);
            }
        }
    }

    /// Trades never overlap: each entry comes strictly after the previous exit
    #[test]
    fn engine_trades_alternate(z in zscores()) {
        let n = z.len();
        let ones = vec![1.0; n];
        let result = StrategyEngine::default().run(&z, &ones, &ones, &ones).unwrap();

        let mut last_exit: Option<usize> = None;
        for trade in &result.trades {
            prop_assert!(trade.entry_index < trade.exit_index);
            if let Some(prev) = last_exit {
                prop_assert!(trade.entry_index > prev);
            }
            last_exit = Some(trade.exit_index);
        }
        if let Some(entry) = result.final_position.entry() {
            prop_assert!(last_exit.map_or(true, |prev| entry.index > prev));
        }
    }

    /// Same inputs, same trades and total
    #[test]
    fn engine_is_idempotent(z in zscores(), pairs in prices()) {
        let n = z.len().min(pairs.len());
        let z = &z[..n];
        let y: Vec<f64> = pairs[..n].iter().map(|p| p.0).collect();
        let x: Vec<f64> = pairs[..n].iter().map(|p| p.1).collect();
        let hr = vec![0.8; n];

        let engine = StrategyEngine::new(1.5, 0.0).unwrap();
        let first = engine.run(z, &y, &x, &hr).unwrap();
        let second = engine.run(z, &y, &x, &hr).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.total_profit, nan_safe_sum(first.pnls()));
    }
}
