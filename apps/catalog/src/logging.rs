//! Logging bootstrap built on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Initialize the global subscriber from configuration.
///
/// `RUST_LOG` wins over the configured level, so operators can raise
/// verbosity for a single run without touching config.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
