//! Core data models for research papers and search operations.

mod paper;
mod request;
mod search;
mod web;

pub use paper::{Paper, PaperBuilder, SourceType};
pub use request::{
    validate_year, AggregatedSearchRequest, ArxivSearchRequest, CitationNetworkRequest,
    OpenAlexSearchRequest, SemanticScholarSearchRequest, ValidationError,
};
pub use search::{SearchQuery, SearchResponse, SortBy};
pub use web::{
    ExtractDepth, ExtractFormat, SearchDepth, TimeRange, WebCrawlRequest, WebExtractRequest,
    WebMapRequest, WebSearchRequest, WebTopic,
};
