//! Search request and response models.

use serde::{Deserialize, Serialize};

use super::{Paper, SourceType};

/// Sort field for search results
///
/// Accepts the spellings used by the individual backends
/// (`cited_by_count`, `citationCount`, `publicationDate`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    #[serde(alias = "publicationDate", alias = "date", alias = "submittedDate")]
    PublicationDate,
    #[serde(
        alias = "cited_by_count",
        alias = "citationCount",
        alias = "citations"
    )]
    CitationCount,
}

/// Search query parameters shared by every adapter
///
/// Options a backend cannot express are ignored by that backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Main search query string
    pub query: String,

    /// Maximum number of results to return
    pub max_results: usize,

    /// Year filter (`2023`, `>2020`, `<2020`, `2020-2023`, `2020-`, `-2015`)
    pub year: Option<String>,

    /// Sort by field
    pub sort_by: SortBy,

    /// Only return open-access papers
    pub open_access_only: bool,

    /// Minimum citation count
    pub min_citations: Option<u32>,

    /// Field-of-study filter (Semantic Scholar)
    pub fields_of_study: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: 10,
            year: None,
            sort_by: SortBy::Relevance,
            open_access_only: false,
            min_citations: None,
            fields_of_study: None,
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set year filter
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// Set sort by
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    /// Restrict to open-access papers
    pub fn open_access_only(mut self, only: bool) -> Self {
        self.open_access_only = only;
        self
    }

    /// Set minimum citation count
    pub fn min_citations(mut self, min: u32) -> Self {
        self.min_citations = Some(min);
        self
    }

    /// Set field-of-study filter
    pub fn fields_of_study(mut self, fields: impl Into<String>) -> Self {
        self.fields_of_study = Some(fields.into());
        self
    }

    /// Human-readable summary of active filters, empty when none apply
    pub fn filter_description(&self) -> String {
        let mut parts = Vec::new();
        if let Some(year) = &self.year {
            parts.push(format!("year: {}", year));
        }
        if self.open_access_only {
            parts.push("open access only".to_string());
        }
        if let Some(min) = self.min_citations {
            parts.push(format!("citations ≥ {}", min));
        }
        if let Some(fields) = &self.fields_of_study {
            parts.push(format!("field: {}", fields));
        }
        parts.join(", ")
    }
}

/// Search response containing papers and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Papers found
    pub papers: Vec<Paper>,

    /// Total number of matches reported by the backend (may exceed `papers.len()`)
    pub total_results: Option<u64>,

    /// Backend that produced the results
    pub source: SourceType,

    /// Query that was executed
    pub query: String,
}

impl SearchResponse {
    /// Create a new search response
    pub fn new(papers: Vec<Paper>, source: SourceType, query: impl Into<String>) -> Self {
        Self {
            papers,
            total_results: None,
            source,
            query: query.into(),
        }
    }

    /// Set total results
    pub fn total_results(mut self, total: u64) -> Self {
        self.total_results = Some(total);
        self
    }

    /// Whether the backend returned zero matches
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}
