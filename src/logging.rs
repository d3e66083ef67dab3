use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

use crate::config::LoggingConfig;

/// Start logging to stderr. `RUST_LOG` overrides the configured spec.
/// Keep the handle alive for the life of the program.
pub fn init(config: &LoggingConfig) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(&config.spec)?
        .format(flexi_logger::colored_default_format)
        .start()
}
