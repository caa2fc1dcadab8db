//! Structured logging setup.
//!
//! Two sinks: the console (INFO by default, `RUST_LOG` overrides, plain or
//! JSON) and an append-only log file that also keeps DEBUG records. Both
//! carry timestamp, target, source line and level. If the log file cannot
//! be opened the run continues with the console alone.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::RuntimeSettings;

const CONSOLE_FILTER: &str = "citybox=info";
const FILE_FILTER: &str = "citybox=debug";

/// Install the run's subscriber. Logging stops when the guard drops.
///
/// Notices collected while resolving `settings` are emitted as warnings
/// once the subscriber is in place.
pub fn init(settings: &RuntimeSettings) -> DefaultGuard {
    let console_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CONSOLE_FILTER));

    let plain = (!settings.log_json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_filter(console_filter())
    });
    let json = settings.log_json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_line_number(true)
            .with_filter(console_filter())
    });

    let (durable, file_error) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
    {
        Ok(file) => {
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_writer(Mutex::new(file))
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), None)
        }
        Err(e) => (None, Some(e)),
    };

    let subscriber = tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(durable);
    let guard = tracing::subscriber::set_default(subscriber);

    if let Some(e) = file_error {
        warn!(
            path = %settings.log_file.display(),
            error = %e,
            "Log file unavailable, logging to console only"
        );
    }
    for notice in &settings.notices {
        warn!("{notice}");
    }

    guard
}
