//! Paper-search backends behind a uniform trait.
//!
//! This module defines the [`Source`] trait that every backend implements.
//! A backend is registered with the [`SourceRegistry`] under its
//! [`SourceType`]; the aggregator and the citation pipeline only ever talk to
//! `dyn Source`, which is also what lets tests substitute a [`MockSource`].
//!
//! # Error model
//!
//! Adapters never panic or retry. Every transport or protocol failure is
//! mapped into a [`SourceError`] kind close to where it happened:
//!
//! | Failure | Kind |
//! |---|---|
//! | reqwest timeout | [`SourceError::Timeout`] |
//! | connection failure | [`SourceError::Network`] |
//! | HTTP 403 / 429 | [`SourceError::RateLimit`] |
//! | HTTP 404 | [`SourceError::NotFound`] |
//! | HTTP 5xx | [`SourceError::Server`] |
//! | other non-2xx | [`SourceError::Api`] |
//! | JSON / Atom decode failure | [`SourceError::Parse`] |
//!
//! A successful call with zero matches is *not* an error: it is an empty
//! [`SearchResponse`].

mod arxiv;
pub mod mock;
mod openalex;
mod registry;
mod semantic;

pub use arxiv::ArxivSource;
pub use mock::MockSource;
pub use openalex::OpenAlexSource;
pub use registry::{SourceCapabilities, SourceRegistry};
pub use semantic::SemanticScholarSource;

use crate::models::{Paper, SearchQuery, SearchResponse, SourceType};
use async_trait::async_trait;
use reqwest::StatusCode;

/// The Source trait defines the interface for all paper-search backends.
///
/// Only `id`, `name` and `source_type` are required. Everything else defaults
/// to [`SourceError::NotImplemented`] and is advertised through
/// [`Source::capabilities`].
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (used in tool names, e.g. "openalex")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Provenance tag stamped on every paper this source produces
    fn source_type(&self) -> SourceType;

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Whether this source supports search
    fn supports_search(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::SEARCH)
    }

    /// Whether this source supports citation/reference lookup
    fn supports_citations(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::CITATIONS)
    }

    /// Whether this source supports lookup by DOI
    fn supports_doi_lookup(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::DOI_LOOKUP)
    }

    // ========== SEARCH METHODS ==========

    /// Search for papers matching the query
    async fn search(&self, _query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Free-text title search returning the top hit
    async fn search_by_title(&self, _title: &str) -> Result<Paper, SourceError> {
        Err(SourceError::NotImplemented)
    }

    // ========== LOOKUP METHODS ==========

    /// Get a paper by its native ID
    async fn get_by_id(&self, _id: &str) -> Result<Paper, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Get a paper by its arXiv identifier
    async fn get_by_arxiv_id(&self, _arxiv_id: &str) -> Result<Paper, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Get a paper by its DOI
    async fn get_by_doi(&self, _doi: &str) -> Result<Paper, SourceError> {
        Err(SourceError::NotImplemented)
    }

    // ========== CITATION METHODS ==========

    /// Papers referenced by this paper
    async fn get_references(
        &self,
        _paper_id: &str,
        _limit: usize,
    ) -> Result<Vec<Paper>, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Papers that cite this paper
    async fn get_citations(
        &self,
        _paper_id: &str,
        _limit: usize,
    ) -> Result<Vec<Paper>, SourceError> {
        Err(SourceError::NotImplemented)
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// The request did not complete within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 403 or 429
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// HTTP 404 or an empty lookup
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 5xx
    #[error("Server error (HTTP {status})")]
    Server { status: u16 },

    /// Any other unsuccessful HTTP status
    #[error("API error: {0}")]
    Api(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The search task itself failed (panic or cancellation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SourceError {
    /// Map an unsuccessful HTTP status onto an error kind
    pub fn from_status(status: StatusCode, source_name: &str) -> Self {
        match status.as_u16() {
            403 | 429 => SourceError::RateLimit(format!("{} is throttling requests", source_name)),
            404 => SourceError::NotFound(format!("{} has no such resource", source_name)),
            code if status.is_server_error() => SourceError::Server { status: code },
            code => SourceError::Api(format!("{} returned HTTP {}", source_name, code)),
        }
    }

    /// Short label used in failure summaries
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::NotImplemented => "not supported",
            SourceError::Timeout(_) => "timeout",
            SourceError::Network(_) => "network error",
            SourceError::RateLimit(_) => "rate limited",
            SourceError::NotFound(_) => "not found",
            SourceError::Server { .. } => "server error",
            SourceError::Api(_) => "api error",
            SourceError::Parse(_) => "parse error",
            SourceError::InvalidRequest(_) => "invalid request",
            SourceError::Internal(_) => "internal error",
        }
    }

    /// Suggestion shown to the user next to the error
    pub fn hint(&self) -> &'static str {
        match self {
            SourceError::NotImplemented => "Use a different source for this operation.",
            SourceError::Timeout(_) => "Try again later, or use more specific search terms.",
            SourceError::Network(_) => "Check your network connection or try again later.",
            SourceError::RateLimit(_) => "Wait a minute before retrying.",
            SourceError::NotFound(_) => "Check that the search parameters are correct.",
            SourceError::Server { .. } => "This is usually temporary; try again later.",
            SourceError::Api(_) => "Check the request parameters.",
            SourceError::Parse(_) => "The service returned an unexpected response; try again later.",
            SourceError::InvalidRequest(_) => "Fix the request arguments and retry.",
            SourceError::Internal(_) => "Retry the search; other sources were unaffected.",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::from_status(status, "remote service")
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Turn a non-2xx response into the matching error kind
pub(crate) fn ensure_success(
    response: reqwest::Response,
    source_name: &str,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SourceError::from_status(status, source_name))
    }
}
