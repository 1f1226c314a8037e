//! Process-wide logging setup.

/// Tracing subscriber configuration (filter, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, LogFormatError};

/// Initialize tracing from `RUST_LOG` and `PRICEDB_LOG_FORMAT`.
///
/// Safe to call multiple times; subsequent calls become no-ops. An
/// unrecognized format falls back to JSON and is reported once the
/// subscriber is installed.
pub fn init() {
    let raw = std::env::var("PRICEDB_LOG_FORMAT").ok();
    let parsed = raw.as_deref().map(str::parse::<LogFormat>).transpose();

    match parsed {
        Ok(format) => tracing::init(format.unwrap_or_default()),
        Err(err) => {
            tracing::init(LogFormat::default());
            ::tracing::warn!(error = %err, "falling back to json logs");
        }
    }
}
