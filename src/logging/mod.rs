//! Logging and Trade Recording Module
//!
//! - `init_tracing` - Installs the global tracing subscriber
//! - `TradeRecorder` trait - Pluggable recorder interface
//! - `CsvRecorder` - CSV file recorder
//! - `TracingRecorder` - Structured `trades` target events

pub mod csv_recorder;
pub mod recorder;
pub mod tracing_recorder;

pub use csv_recorder::CsvRecorder;
pub use recorder::{MultiRecorder, RecordError, TradeRecord, TradeRecorder};
pub use tracing_recorder::TracingRecorder;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. With `json` set, events are
/// written as one JSON object per line; otherwise in the compact human format.
pub fn init_tracing(level: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }
    Ok(())
}
