use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Login and submission attempt budgets are not 0
/// - Login poll interval is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let polling = &config.polling;
    if polling.login_max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "polling.login_max_attempts cannot be 0".to_string(),
        ));
    }
    if polling.login_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "polling.login_interval_secs cannot be 0".to_string(),
        ));
    }
    if polling.submit_max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "polling.submit_max_attempts cannot be 0".to_string(),
        ));
    }

    Ok(())
}
