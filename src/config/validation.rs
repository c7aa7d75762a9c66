use crate::config::types::{Config, FetcherConfig, ServerConfig, StorageConfig, YouTubeConfig};
use crate::ConfigError;
use url::Url;

/// Thirty days
pub const MAX_FALLBACK_WINDOW_SECS: u64 = 30 * 24 * 3600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_youtube_config(&config.youtube)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_storage_config(&config.storage)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates upstream API configuration
fn validate_youtube_config(config: &YouTubeConfig) -> Result<(), ConfigError> {
    if config.api_keys.is_empty() {
        return Err(ConfigError::Validation(
            "at least one API key is required (api-keys or YOUTUBE_API_KEYS)".to_string(),
        ));
    }

    if let Some(position) = config.api_keys.iter().position(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "api-keys entry {} is empty",
            position
        )));
    }

    if config.search_query.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search-query cannot be empty".to_string(),
        ));
    }

    if config.max_results < 1 || config.max_results > 50 {
        return Err(ConfigError::Validation(format!(
            "max-results must be between 1 and 50, got {}",
            config.max_results
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    let url = Url::parse(&config.api_base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "api-base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "interval-secs must be >= 1, got {}",
            config.interval_secs
        )));
    }

    if config.fallback_window_secs < 1 || config.fallback_window_secs > MAX_FALLBACK_WINDOW_SECS
    {
        return Err(ConfigError::Validation(format!(
            "fallback-window-secs must be between 1 and {}, got {}",
            MAX_FALLBACK_WINDOW_SECS, config.fallback_window_secs
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.default_limit < 1 {
        return Err(ConfigError::Validation(
            "default-limit must be >= 1".to_string(),
        ));
    }

    if config.max_limit < config.default_limit {
        return Err(ConfigError::Validation(format!(
            "max-limit ({}) must be >= default-limit ({})",
            config.max_limit, config.default_limit
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn youtube_config() -> YouTubeConfig {
        YouTubeConfig {
            api_keys: vec!["key".to_string()],
            search_query: "cricket".to_string(),
            max_results: 25,
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_validate_youtube_config() {
        assert!(validate_youtube_config(&youtube_config()).is_ok());

        let mut config = youtube_config();
        config.api_keys = vec!["a".to_string(), "  ".to_string()];
        assert!(validate_youtube_config(&config).is_err());

        let mut config = youtube_config();
        config.search_query = " ".to_string();
        assert!(validate_youtube_config(&config).is_err());

        let mut config = youtube_config();
        config.max_results = 51;
        assert!(validate_youtube_config(&config).is_err());

        let mut config = youtube_config();
        config.api_base_url = "not a url".to_string();
        assert!(matches!(
            validate_youtube_config(&config),
            Err(ConfigError::InvalidUrl(_))
        ));

        let mut config = youtube_config();
        config.api_base_url = "ftp://example.com".to_string();
        assert!(validate_youtube_config(&config).is_err());
    }

    #[test]
    fn test_validate_fetcher_config() {
        assert!(validate_fetcher_config(&FetcherConfig::default()).is_ok());

        let config = FetcherConfig {
            interval_secs: 0,
            ..FetcherConfig::default()
        };
        assert!(validate_fetcher_config(&config).is_err());

        let config = FetcherConfig {
            fallback_window_secs: 0,
            ..FetcherConfig::default()
        };
        assert!(validate_fetcher_config(&config).is_err());

        let config = FetcherConfig {
            fallback_window_secs: MAX_FALLBACK_WINDOW_SECS + 1,
            ..FetcherConfig::default()
        };
        assert!(validate_fetcher_config(&config).is_err());
    }

    #[test]
    fn test_validate_server_limits() {
        assert!(validate_server_config(&ServerConfig::default()).is_ok());

        let config = ServerConfig {
            default_limit: 20,
            max_limit: 10,
            ..ServerConfig::default()
        };
        assert!(validate_server_config(&config).is_err());

        let config = ServerConfig {
            default_limit: 0,
            ..ServerConfig::default()
        };
        assert!(validate_server_config(&config).is_err());
    }
}
