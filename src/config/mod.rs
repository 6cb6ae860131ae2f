//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `RESEARCH_SCOUT__<SECTION>__<KEY>` environment variables. The two API
//! credentials also honour their conventional variables
//! (`SEMANTIC_SCHOLAR_API_KEY`, `OPENALEX_EMAIL`, `TAVILY_API_KEY`) when
//! nothing else set them.

mod file_config;

pub use file_config::{
    default_config_path, find_config_file, ConfigFile, ConfigFileError, LoggingConfig,
};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "RESEARCH_SCOUT";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Credentials for the backends
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Backend base URLs
    #[serde(default)]
    pub endpoints: Endpoints,

    /// HTTP client timeouts
    #[serde(default)]
    pub http: HttpConfig,

    /// Rate limiting settings
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Aggregated search settings
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Citation-network settings
    #[serde(default)]
    pub citation: CitationConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Semantic Scholar API key (optional, for higher rate limits)
    #[serde(default)]
    pub semantic_scholar: Option<String>,

    /// Contact address for the OpenAlex polite pool
    #[serde(default)]
    pub openalex_email: Option<String>,

    /// Tavily API key; the web tools refuse to run without it
    #[serde(default)]
    pub tavily: Option<String>,
}

impl ApiKeys {
    /// Fill unset keys from the conventional environment variables
    fn with_env_fallbacks(mut self) -> Self {
        if self.semantic_scholar.is_none() {
            self.semantic_scholar = non_empty_env("SEMANTIC_SCHOLAR_API_KEY");
        }
        if self.openalex_email.is_none() {
            self.openalex_email = non_empty_env("OPENALEX_EMAIL");
        }
        if self.tavily.is_none() {
            self.tavily = non_empty_env("TAVILY_API_KEY");
        }
        self
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Backend base URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_openalex_url")]
    pub openalex: String,

    #[serde(default = "default_arxiv_url")]
    pub arxiv: String,

    #[serde(default = "default_semantic_scholar_url")]
    pub semantic_scholar: String,

    #[serde(default = "default_tavily_url")]
    pub tavily: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openalex: default_openalex_url(),
            arxiv: default_arxiv_url(),
            semantic_scholar: default_semantic_scholar_url(),
            tavily: default_tavily_url(),
        }
    }
}

fn default_openalex_url() -> String {
    "https://api.openalex.org".to_string()
}

fn default_arxiv_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_semantic_scholar_url() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}

fn default_tavily_url() -> String {
    "https://api.tavily.com".to_string()
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Semantic Scholar requests per second
    #[serde(default = "default_s2_rps")]
    pub semantic_scholar_requests_per_second: f32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            semantic_scholar_requests_per_second: default_s2_rps(),
        }
    }
}

fn default_s2_rps() -> f32 {
    1.0
}

/// Aggregated search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Extra seconds the fan-in barrier waits beyond the per-source timeout
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period(),
        }
    }
}

fn default_grace_period() -> u64 {
    5
}

/// Citation-network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationConfig {
    /// Year that citation-mode recency is measured against
    #[serde(default = "default_reference_year")]
    pub reference_year: i32,

    /// How many references / citations to fetch before ranking
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            reference_year: default_reference_year(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_reference_year() -> i32 {
    crate::citation::CITATION_REFERENCE_YEAR
}

fn default_fetch_limit() -> usize {
    100
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;
    config.api_keys = config.api_keys.with_env_fallbacks();
    Ok(config)
}

/// Get the effective configuration, discovering a config file when present
pub fn get_config() -> Result<Config, config::ConfigError> {
    let path = find_config_file();
    load_config(path.as_deref())
}
