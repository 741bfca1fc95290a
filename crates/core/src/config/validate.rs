use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Source URL and page size
/// - Crawler concurrency and stop threshold
/// - Retry attempt bound
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.source.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "source.base_url cannot be empty".to_string(),
        ));
    }

    if config.source.page_size == 0 || config.source.page_size > 100 {
        return Err(ConfigError::ValidationError(
            "source.page_size must be between 1 and 100".to_string(),
        ));
    }

    if config.crawler.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "crawler.concurrency cannot be 0".to_string(),
        ));
    }

    if config.crawler.caught_up_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "crawler.caught_up_threshold cannot be 0".to_string(),
        ));
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts cannot be 0".to_string(),
        ));
    }

    Ok(())
}
