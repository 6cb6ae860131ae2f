//! Typed tool requests, validated at the boundary before any network call.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use super::{SearchQuery, SortBy, SourceType};

/// Boundary validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },

    #[error("invalid year filter '{0}' (expected 2023, >2020, <2020 or 2020-2023)")]
    InvalidYear(String),

    #[error("'{0}' is not an http(s) URL")]
    InvalidUrl(String),
}

pub(super) fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

pub(super) fn check_query(field: &'static str, query: &str) -> Result<(), ValidationError> {
    if query.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}|[<>]\d{4}|\d{4}-\d{4}|\d{4}-|-\d{4})$").expect("valid year regex")
    })
}

/// Validate a year filter expression
pub fn validate_year(year: &str) -> Result<(), ValidationError> {
    if year_pattern().is_match(year.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidYear(year.to_string()))
    }
}

fn default_per_source() -> usize {
    5
}

fn default_sources() -> Vec<SourceType> {
    SourceType::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_results() -> usize {
    10
}

fn default_network_cap() -> usize {
    5
}

/// Multi-source aggregated search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSearchRequest {
    /// Search query
    pub query: String,

    /// Results requested from each backend (1-20)
    #[serde(default = "default_per_source")]
    pub max_results_per_source: usize,

    /// Backends to query (non-empty)
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceType>,

    /// Collapse duplicates found in several backends
    #[serde(default = "default_true")]
    pub deduplicate: bool,

    /// Per-backend timeout in seconds (10-60)
    #[serde(default = "default_timeout_secs")]
    pub timeout_per_source: u64,
}

impl AggregatedSearchRequest {
    /// Create a request with default options
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results_per_source: default_per_source(),
            sources: default_sources(),
            deduplicate: true,
            timeout_per_source: default_timeout_secs(),
        }
    }

    /// Set the backends to query
    pub fn sources(mut self, sources: impl IntoIterator<Item = SourceType>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    /// Set results per backend
    pub fn max_results_per_source(mut self, max: usize) -> Self {
        self.max_results_per_source = max;
        self
    }

    /// Enable or disable deduplication
    pub fn deduplicate(mut self, dedup: bool) -> Self {
        self.deduplicate = dedup;
        self
    }

    /// Set per-backend timeout in seconds
    pub fn timeout_per_source(mut self, secs: u64) -> Self {
        self.timeout_per_source = secs;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_query("query", &self.query)?;
        check_range(
            "max_results_per_source",
            self.max_results_per_source as u64,
            1,
            20,
        )?;
        if self.sources.is_empty() {
            return Err(ValidationError::Empty("sources"));
        }
        check_range("timeout_per_source", self.timeout_per_source, 10, 60)
    }

    /// Requested backends with repeats removed, in request order
    pub fn unique_sources(&self) -> Vec<SourceType> {
        let mut seen = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            if !seen.contains(source) {
                seen.push(*source);
            }
        }
        seen
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_per_source)
    }

    /// The query each backend receives
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::new(self.query.trim()).max_results(self.max_results_per_source)
    }
}

/// OpenAlex search tool arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAlexSearchRequest {
    pub query: String,

    /// 1-200
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default)]
    pub sort_by: SortBy,

    /// `2023`, `>2020`, `<2020` or `2020-2023`
    #[serde(default)]
    pub publication_year: Option<String>,

    #[serde(default)]
    pub open_access_only: bool,

    #[serde(default)]
    pub cited_by_count_min: Option<u32>,
}

impl OpenAlexSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: default_max_results(),
            sort_by: SortBy::Relevance,
            publication_year: None,
            open_access_only: false,
            cited_by_count_min: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_query("query", &self.query)?;
        check_range("max_results", self.max_results as u64, 1, 200)?;
        if let Some(year) = &self.publication_year {
            validate_year(year)?;
        }
        Ok(())
    }

    pub fn to_search_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(self.query.trim())
            .max_results(self.max_results)
            .sort_by(self.sort_by)
            .open_access_only(self.open_access_only);
        query.year = self.publication_year.clone();
        query.min_citations = self.cited_by_count_min;
        query
    }
}

/// arXiv search tool arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivSearchRequest {
    pub query: String,

    /// 1-100
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub year: Option<String>,
}

impl ArxivSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: default_max_results(),
            sort_by: SortBy::Relevance,
            year: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_query("query", &self.query)?;
        check_range("max_results", self.max_results as u64, 1, 100)?;
        if let Some(year) = &self.year {
            validate_year(year)?;
        }
        Ok(())
    }

    pub fn to_search_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(self.query.trim())
            .max_results(self.max_results)
            .sort_by(self.sort_by);
        query.year = self.year.clone();
        query
    }
}

/// Semantic Scholar search tool arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticScholarSearchRequest {
    pub query: String,

    /// 1-100
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default)]
    pub year_filter: Option<String>,

    #[serde(default)]
    pub min_citation_count: Option<u32>,

    #[serde(default)]
    pub fields_of_study: Option<String>,

    #[serde(default)]
    pub sort: SortBy,

    #[serde(default)]
    pub open_access_only: bool,
}

impl SemanticScholarSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: default_max_results(),
            year_filter: None,
            min_citation_count: None,
            fields_of_study: None,
            sort: SortBy::Relevance,
            open_access_only: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_query("query", &self.query)?;
        check_range("max_results", self.max_results as u64, 1, 100)?;
        if let Some(year) = &self.year_filter {
            validate_year(year)?;
        }
        Ok(())
    }

    pub fn to_search_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(self.query.trim())
            .max_results(self.max_results)
            .sort_by(self.sort)
            .open_access_only(self.open_access_only);
        query.year = self.year_filter.clone();
        query.min_citations = self.min_citation_count;
        query.fields_of_study = self.fields_of_study.clone();
        query
    }
}

/// Citation-network analysis arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationNetworkRequest {
    /// Title, DOI, arXiv ID, Semantic Scholar ID or URL
    pub paper_identifier: String,

    /// 1-50
    #[serde(default = "default_network_cap")]
    pub max_references: usize,

    /// 1-50
    #[serde(default = "default_network_cap")]
    pub max_citations: usize,
}

impl CitationNetworkRequest {
    pub fn new(paper_identifier: impl Into<String>) -> Self {
        Self {
            paper_identifier: paper_identifier.into(),
            max_references: default_network_cap(),
            max_citations: default_network_cap(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_query("paper_identifier", &self.paper_identifier)?;
        check_range("max_references", self.max_references as u64, 1, 50)?;
        check_range("max_citations", self.max_citations as u64, 1, 50)
    }
}
