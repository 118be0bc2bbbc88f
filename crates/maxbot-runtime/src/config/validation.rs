//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    ApiConfig, LogOutput, LoggingConfig, LongPollingConfig, MaxbotConfig, WebhookConfig,
};

/// Upper bound the platform accepts for `limit`.
const MAX_POLL_LIMIT: u32 = 1000;

/// Upper bound the platform accepts for the long-poll wait.
const MAX_POLL_TIMEOUT_SECS: u32 = 90;

/// Validates the entire configuration.
pub fn validate_config(config: &MaxbotConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_api_config(&config.api)?;
    validate_webhook_config(&config.webhook)?;
    validate_long_polling_config(&config.long_polling)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when output is 'file'",
        ));
    }
    if logging.max_files == Some(0) {
        return Err(ConfigError::validation(
            "logging.max_files must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_api_config(api: &ApiConfig) -> ConfigResult<()> {
    validate_url(&api.base_url)?;
    if api.timeout_secs == 0 {
        return Err(ConfigError::validation(
            "api.timeout_secs must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_webhook_config(webhook: &WebhookConfig) -> ConfigResult<()> {
    validate_port(webhook.port)?;
    validate_path_prefix(&webhook.path_prefix)?;
    if let Some(url) = &webhook.public_url {
        validate_url(url)?;
    }
    Ok(())
}

fn validate_long_polling_config(polling: &LongPollingConfig) -> ConfigResult<()> {
    if let Some(limit) = polling.limit
        && !(1..=MAX_POLL_LIMIT).contains(&limit)
    {
        return Err(ConfigError::validation(format!(
            "long_polling.limit must be between 1 and {MAX_POLL_LIMIT}, got {limit}"
        )));
    }
    if polling.request_timeout_secs > MAX_POLL_TIMEOUT_SECS {
        return Err(ConfigError::validation(format!(
            "long_polling.request_timeout_secs must be at most {MAX_POLL_TIMEOUT_SECS}"
        )));
    }
    if polling.error_pause_ms == 0 {
        return Err(ConfigError::validation(
            "long_polling.error_pause_ms must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    const SCHEMES: [&str; 2] = ["http://", "https://"];

    if !SCHEMES.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {SCHEMES:?}"),
        ));
    }
    Ok(())
}

fn validate_port(port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

/// An empty prefix mounts bots at the root.
fn validate_path_prefix(prefix: &str) -> ConfigResult<()> {
    if !prefix.is_empty() && !prefix.starts_with('/') {
        return Err(ConfigError::validation(
            "webhook.path_prefix must be empty or start with '/'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&MaxbotConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = MaxbotConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("logs/maxbot.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_public_url() {
        let mut config = MaxbotConfig::default();
        config.webhook.public_url = Some("ftp://example.com".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_invalid_port() {
        let mut config = MaxbotConfig::default();
        config.webhook.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_path_prefix() {
        let mut config = MaxbotConfig::default();
        config.webhook.path_prefix = String::new();
        assert!(validate_config(&config).is_ok());

        config.webhook.path_prefix = "hooks".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_poll_limit_range() {
        let mut config = MaxbotConfig::default();
        config.long_polling.limit = Some(0);
        assert!(validate_config(&config).is_err());

        config.long_polling.limit = Some(1000);
        assert!(validate_config(&config).is_ok());

        config.long_polling.limit = Some(1001);
        assert!(validate_config(&config).is_err());
    }
}
