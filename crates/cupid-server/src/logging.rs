//! Tracing subscriber setup

use crate::config::LoggingSection;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(logging: &LoggingSection) -> Result<(), crate::CupidError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .map_err(|e| crate::CupidError::Logging(format!("invalid level '{}': {}", logging.level, e)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| crate::CupidError::Logging(e.to_string()))
}
