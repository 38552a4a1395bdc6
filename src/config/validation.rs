use crate::config::types::{Config, LogOutput, LoggingConfig, RequestsConfig};
use crate::ConfigError;
use tokio::sync::Semaphore;

/// Log levels accepted in the `[logging]` section
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_requests_config(&config.requests)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates request configuration
fn validate_requests_config(config: &RequestsConfig) -> Result<(), ConfigError> {
    // timeout, retries and max_concurrent are unsigned; 0 is meaningful for each

    if config.max_concurrent > Semaphore::MAX_PERMITS {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be <= {}, got {}",
            Semaphore::MAX_PERMITS,
            config.max_concurrent
        )));
    }

    if config.progress_interval < 10 {
        return Err(ConfigError::Validation(format!(
            "progress-interval must be >= 10ms, got {}ms",
            config.progress_interval
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates logging configuration
fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if !LOG_LEVELS.contains(&config.level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging level must be one of {}, got '{}'",
            LOG_LEVELS.join(", "),
            config.level
        )));
    }

    if config.output == LogOutput::File
        && config.file.as_deref().map_or(true, |f| f.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "logging output 'file' requires a file path".to_string(),
        ));
    }

    Ok(())
}
