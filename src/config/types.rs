use serde::Deserialize;

/// Main configuration structure for Tubewatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream search API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeConfig {
    /// API keys, tried in order; the client rotates on quota exhaustion
    #[serde(rename = "api-keys", default)]
    pub api_keys: Vec<String>,

    /// The single search term polled by the fetcher
    #[serde(rename = "search-query", default = "default_search_query")]
    pub search_query: String,

    /// Maximum number of results requested per search call
    #[serde(rename = "max-results", default = "default_max_results")]
    pub max_results: u32,

    /// Base URL of the search API (without the `/search` suffix)
    #[serde(rename = "api-base-url", default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Background fetch scheduling
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Seconds between fetch cycles
    #[serde(rename = "interval-secs", default = "default_interval")]
    pub interval_secs: u64,

    /// How far back the first cycle looks when the store is empty (seconds)
    #[serde(rename = "fallback-window-secs", default = "default_fallback_window")]
    pub fallback_window_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            fallback_window_secs: default_fallback_window(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// HTTP read endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Page size used when `limit` is absent, non-positive or unparsable
    #[serde(rename = "default-limit", default = "default_limit")]
    pub default_limit: usize,

    /// Upper bound applied to caller-supplied `limit` values
    #[serde(rename = "max-limit", default = "default_max_limit")]
    pub max_limit: usize,

    /// Origins allowed by the CORS layer
    #[serde(rename = "allowed-origins", default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_search_query() -> String {
    "cricket".to_string()
}

fn default_max_results() -> u32 {
    25
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_interval() -> u64 {
    10
}

fn default_fallback_window() -> u64 {
    3600
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}
