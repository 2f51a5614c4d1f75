//! Cointegration command handler.

use serde::Serialize;
use tracing::{info, warn};

use crate::cli::CointCliConfig;
use crate::cointegration::{CointegrationResult, CointegrationTest, EngleGranger, PairDiagnostics};

/// Report printed by the `coint` command.
#[derive(Debug, Serialize)]
pub struct CointReport {
    pub symbol_y: String,
    pub symbol_x: String,
    pub bars: usize,
    pub result: CointegrationResult,
    pub diagnostics: PairDiagnostics,
}

/// Test the pair for cointegration and print a JSON report to stdout.
pub fn run_coint(config: CointCliConfig) -> Result<CointReport, Box<dyn std::error::Error>> {
    let series = super::load_series(&config.source)?;

    let result = EngleGranger::new(config.significance).test(&series.columns())?;
    let diagnostics = PairDiagnostics::compute(&series.y, &series.x);

    if result.cointegrated {
        info!(
            pair = %format!("{}/{}", series.symbol_y, series.symbol_x),
            "Pair is cointegrated at {}", result.significance
        );
    } else {
        warn!(
            pair = %format!("{}/{}", series.symbol_y, series.symbol_x),
            "Pair is not cointegrated at {}", result.significance
        );
    }

    let report = CointReport {
        symbol_y: series.symbol_y.clone(),
        symbol_x: series.symbol_x.clone(),
        bars: series.len(),
        result,
        diagnostics,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::DataSource;
    use crate::cointegration::Significance;

    #[test]
    fn test_coint_on_synthetic_pair() {
        let report = run_coint(CointCliConfig {
            source: DataSource::Synthetic {
                candles: 300,
                seed: 1,
            },
            significance: Significance::FivePercent,
        })
        .unwrap();

        assert_eq!(report.bars, 300);
        assert!(report.result.cointegrated);
        assert!(report.diagnostics.correlation.unwrap() > 0.9);
    }
}
