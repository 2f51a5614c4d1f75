use kalman_pairs::cointegration::{CointegrationResult, CointegrationTest, Significance};
use kalman_pairs::config::PipelineConfig;
use kalman_pairs::data::{generate_pair, AlignedSeries, SyntheticPairConfig};
use kalman_pairs::pipeline;
use kalman_pairs::PipelineError;
use mockall::mock;

// --- Mocks ---

mock! {
    pub Coint {}

    impl CointegrationTest for Coint {
        fn test(&self, columns: &[Vec<f64>]) -> kalman_pairs::Result<CointegrationResult>;
    }
}

fn verdict(cointegrated: bool) -> CointegrationResult {
    CointegrationResult {
        cointegrated,
        statistic: if cointegrated { -5.0 } else { -1.0 },
        critical_value: -3.34,
        significance: Significance::FivePercent,
        method: "mock".to_string(),
    }
}

fn series() -> AlignedSeries {
    generate_pair(
        2024,
        500,
        &SyntheticPairConfig {
            noise: 2.0,
            ..Default::default()
        },
    )
    .unwrap()
}

#[test]
fn test_pipeline_proceeds_when_not_cointegrated() {
    let series = series();
    let mut coint = MockCoint::new();
    coint
        .expect_test()
        .times(1)
        .returning(|_| Ok(verdict(false)));

    let output = pipeline::run(&series, &coint, &PipelineConfig::default()).unwrap();

    assert!(!output.cointegration.cointegrated);
    assert_eq!(output.cointegration.method, "mock");
    assert_eq!(output.zscore.len(), series.len());
}

#[test]
fn test_verdict_does_not_change_signal_or_trades() {
    let series = series();
    let config = PipelineConfig::default();

    let mut passing = MockCoint::new();
    passing.expect_test().returning(|_| Ok(verdict(true)));
    let mut failing = MockCoint::new();
    failing.expect_test().returning(|_| Ok(verdict(false)));

    let a = pipeline::run(&series, &passing, &config).unwrap();
    let b = pipeline::run(&series, &failing, &config).unwrap();

    assert_eq!(a.hedge_ratio, b.hedge_ratio);
    assert_eq!(a.spread, b.spread);
    assert_eq!(a.backtest, b.backtest);
}

#[test]
fn test_coint_receives_both_price_columns() {
    let series = series();
    let n = series.len();
    let first_y = series.y[0];
    let first_x = series.x[0];

    let mut coint = MockCoint::new();
    coint
        .expect_test()
        .withf(move |columns| {
            columns.len() == 2
                && columns[0].len() == n
                && columns[1].len() == n
                && columns[0][0] == first_y
                && columns[1][0] == first_x
        })
        .times(1)
        .returning(|_| Ok(verdict(true)));

    pipeline::run(&series, &coint, &PipelineConfig::default()).unwrap();
}

#[test]
fn test_coint_error_aborts_run() {
    let series = series();
    let mut coint = MockCoint::new();
    coint
        .expect_test()
        .returning(|_| Err(PipelineError::InvalidInput("prices must have exactly 2 columns".into())));

    let err = pipeline::run(&series, &coint, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[test]
fn test_invalid_config_rejected_before_coint() {
    let series = series();
    let mut coint = MockCoint::new();
    coint.expect_test().times(0);

    let config = PipelineConfig {
        z_entry: 0.0,
        ..Default::default()
    };
    assert!(matches!(
        pipeline::run(&series, &coint, &config),
        Err(PipelineError::InvalidConfig(_))
    ));
}

#[test]
fn test_equal_entry_and_exit_thresholds_are_accepted() {
    let series = series();
    let mut coint = MockCoint::new();
    coint.expect_test().returning(|_| Ok(verdict(true)));
    let config = PipelineConfig {
        z_entry: 1.0,
        z_exit: 1.0,
        ..Default::default()
    };

    let output = pipeline::run(&series, &coint, &config).unwrap();
    assert_eq!(output.zscore.len(), series.len());
    for trade in &output.backtest.trades {
        assert!(trade.entry_index < trade.exit_index);
    }
}

#[test]
fn test_trades_are_consistent_with_zscore() {
    let series = series();
    let mut coint = MockCoint::new();
    coint.expect_test().returning(|_| Ok(verdict(true)));
    let config = PipelineConfig {
        z_entry: 1.5,
        ..Default::default()
    };

    let output = pipeline::run(&series, &coint, &config).unwrap();
    for trade in &output.backtest.trades {
        let z_in = output.zscore[trade.entry_index];
        let z_out = output.zscore[trade.exit_index];
        assert!(z_in.abs() > config.z_entry);
        assert!(trade.entry_index < trade.exit_index);
        match trade.direction {
            kalman_pairs::backtest::Direction::ShortSpread => assert!(z_out <= config.z_exit),
            kalman_pairs::backtest::Direction::LongSpread => assert!(z_out >= config.z_exit),
        }
        assert_eq!(trade.exit_hedge_ratio, output.hedge_ratio[trade.exit_index]);
    }
}
