//! Configuration validation utilities.

use tracing::warn;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogFormat, LogOutput, LoggingConfig, PerchConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &PerchConfig) -> ConfigResult<()> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::validation("Bot name cannot be empty"));
    }

    validate_cache_size("response_cache_size", config.response_cache_size)?;
    validate_cache_size("user_info_cache_size", config.user_info_cache_size)?;

    if config.broadcast_threaded_replies && !config.threaded_replies {
        warn!("broadcast_threaded_replies has no effect unless threaded_replies is enabled");
    }

    validate_logging_config(&config.logging)
}

/// Converts a validated cache size to a capacity.
pub(crate) fn cache_capacity(key: &'static str, value: i64) -> ConfigResult<usize> {
    usize::try_from(value).map_err(|_| ConfigError::InvalidCacheSize { key, value })
}

fn validate_cache_size(key: &'static str, value: i64) -> ConfigResult<()> {
    cache_capacity(key, value).map(drop)
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "logging.format \"json\" requires the json-log feature",
        ));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid logging filter module: {module:?}"
        )));
    }

    Ok(())
}
