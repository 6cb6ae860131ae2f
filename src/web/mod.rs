//! General web search, page extraction, site crawling and site mapping
//! through the Tavily API.
//!
//! Requests are POSTed as JSON with the API key as a bearer token. HTTP
//! failures go through the same [`SourceError`] taxonomy as the paper
//! sources, except that 401 is reported as a rejected key.

mod report;

pub use report::{crawl_report, extract_report, failure_report, map_report, search_report};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::{WebCrawlRequest, WebExtractRequest, WebMapRequest, WebSearchRequest};
use crate::sources::{ensure_success, SourceError};
use crate::utils::HttpClient;

const TAVILY_API_BASE: &str = "https://api.tavily.com";
const SERVICE_NAME: &str = "Tavily";

/// Tavily API client
#[derive(Debug, Clone)]
pub struct TavilyClient {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl TavilyClient {
    /// Create a client against the public API, with no key
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: TAVILY_API_BASE.to_string(),
            api_key: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::from_config(&config.http)?,
            base_url: config.endpoints.tavily.trim_end_matches('/').to_string(),
            api_key: config.api_keys.tavily.clone(),
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point the client at a different endpoint (mock servers in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether an API key is available
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn search(&self, request: &WebSearchRequest) -> Result<WebSearchResponse, SourceError> {
        self.post("search", request).await
    }

    pub async fn extract(
        &self,
        request: &WebExtractRequest,
    ) -> Result<WebExtractResponse, SourceError> {
        self.post("extract", request).await
    }

    pub async fn crawl(&self, request: &WebCrawlRequest) -> Result<WebCrawlResponse, SourceError> {
        self.post("crawl", request).await
    }

    pub async fn map(&self, request: &WebMapRequest) -> Result<WebMapResponse, SourceError> {
        self.post("map", request).await
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, SourceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let key = self.api_key.as_deref().ok_or_else(|| {
            SourceError::InvalidRequest(
                "Tavily API key is not configured; set TAVILY_API_KEY".to_string(),
            )
        })?;

        tracing::debug!(endpoint, "Tavily request");

        let response = self
            .client
            .post(&format!("{}/{}", self.base_url, endpoint))
            .bearer_auth(key)
            .json(body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SourceError::InvalidRequest(
                "Tavily rejected the API key; check TAVILY_API_KEY".to_string(),
            ));
        }

        Ok(ensure_success(response, SERVICE_NAME)?.json().await?)
    }
}

// ===== Tavily API Types =====

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSearchResponse {
    /// Generated answer, present when requested
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<WebResult>,
    #[serde(default)]
    pub images: Vec<WebImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    pub score: Option<f64>,
    pub raw_content: Option<String>,
}

/// Image entries arrive either as bare URLs or as objects with a description
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WebImage {
    Url(String),
    Described {
        url: String,
        description: Option<String>,
    },
}

impl WebImage {
    pub fn url(&self) -> &str {
        match self {
            WebImage::Url(url) | WebImage::Described { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebExtractResponse {
    #[serde(default)]
    pub results: Vec<WebPage>,
    #[serde(default)]
    pub failed_results: Vec<FailedPage>,
}

/// Content fetched from one page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebPage {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub raw_content: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailedPage {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebCrawlResponse {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub results: Vec<WebPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebMapResponse {
    #[serde(default)]
    pub base_url: String,
    /// Discovered URLs
    #[serde(default)]
    pub results: Vec<String>,
}
