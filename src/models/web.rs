//! Web search and crawl tool arguments.
//!
//! Field names follow the Tavily API, so a validated request is also the
//! JSON body sent to it.

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};

use super::request::{check_query, check_range};
use super::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebTopic {
    #[default]
    General,
    News,
    Finance,
}

/// Recency window for web results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[serde(alias = "d")]
    Day,
    #[serde(alias = "w")]
    Week,
    #[serde(alias = "m")]
    Month,
    #[serde(alias = "y")]
    Year,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractDepth {
    Basic,
    #[default]
    Advanced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractFormat {
    #[default]
    Markdown,
    Text,
}

fn default_web_results() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_depth() -> u32 {
    1
}

fn default_breadth() -> u32 {
    20
}

fn default_page_limit() -> u32 {
    50
}

fn check_url(url: &str) -> Result<(), ValidationError> {
    match Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::InvalidUrl(url.to_string())),
    }
}

/// Web search arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchRequest {
    pub query: String,

    /// 1-20
    #[serde(default = "default_web_results")]
    pub max_results: usize,

    #[serde(default)]
    pub search_depth: SearchDepth,

    #[serde(default)]
    pub topic: WebTopic,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,

    /// Ask for a generated answer above the results
    #[serde(default)]
    pub include_answer: bool,

    #[serde(default)]
    pub include_raw_content: bool,

    #[serde(default)]
    pub include_images: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_domains: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_domains: Vec<String>,
}

impl WebSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: default_web_results(),
            search_depth: SearchDepth::default(),
            topic: WebTopic::default(),
            time_range: None,
            include_answer: false,
            include_raw_content: false,
            include_images: false,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_query("query", &self.query)?;
        check_range("max_results", self.max_results as u64, 1, 20)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept either a single URL string or a list of them
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
    })
}

/// Page content extraction arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebExtractRequest {
    /// One URL or a list of up to 20
    #[serde(deserialize_with = "one_or_many")]
    pub urls: Vec<String>,

    #[serde(default)]
    pub include_images: bool,

    #[serde(default)]
    pub extract_depth: ExtractDepth,

    #[serde(default)]
    pub format: ExtractFormat,
}

impl WebExtractRequest {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            include_images: false,
            extract_depth: ExtractDepth::default(),
            format: ExtractFormat::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.urls.is_empty() {
            return Err(ValidationError::Empty("urls"));
        }
        check_range("urls", self.urls.len() as u64, 1, 20)?;
        self.urls.iter().try_for_each(|url| check_url(url))
    }
}

/// Site crawl arguments; also used for site mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebCrawlRequest {
    /// Root URL
    pub url: String,

    /// Link hops from the root, 1-5
    #[serde(default = "default_depth")]
    pub max_depth: u32,

    /// Links followed per page, 1-100
    #[serde(default = "default_breadth")]
    pub max_breadth: u32,

    /// Total pages, 1-200
    #[serde(default = "default_page_limit")]
    pub limit: u32,

    /// Natural-language guidance for which pages to keep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Follow links to other domains
    #[serde(default = "default_true")]
    pub allow_external: bool,
}

/// Site map arguments: the same knobs as a crawl, without page content
pub type WebMapRequest = WebCrawlRequest;

impl WebCrawlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_depth: default_depth(),
            max_breadth: default_breadth(),
            limit: default_page_limit(),
            instructions: None,
            allow_external: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_url(&self.url)?;
        check_range("max_depth", self.max_depth.into(), 1, 5)?;
        check_range("max_breadth", self.max_breadth.into(), 1, 100)?;
        check_range("limit", self.limit.into(), 1, 200)
    }
}
