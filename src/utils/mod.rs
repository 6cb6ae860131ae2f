//! Utility modules supporting the search and citation pipelines.
//!
//! - [`deduplicate_papers`]: remove duplicate papers using DOI / arXiv ID matching and title similarity
//! - [`duplicate_flags`]: the same decision as a per-record mask, without consuming the input
//! - [`normalize_title`] / [`title_similarity`]: the fuzzy title comparison used by deduplication
//! - [`HttpClient`]: reqwest client with the fixed adapter timeouts
//! - [`RateLimiter`]: governor-backed pacing with `wait()` / `try_acquire()`
//!
//! # Deduplication
//!
//! ```rust
//! use research_scout::models::{PaperBuilder, SourceType};
//! use research_scout::utils::deduplicate_papers;
//!
//! let papers = vec![
//!     PaperBuilder::new("W1", "Paper A", SourceType::OpenAlex).doi("10.1234/a").build(),
//!     PaperBuilder::new("1", "Paper A", SourceType::SemanticScholar).doi("10.1234/A").build(),
//! ];
//! assert_eq!(deduplicate_papers(papers).len(), 1);
//! ```

mod dedup;
mod http;
mod rate_limit;

pub use dedup::{
    deduplicate_papers, duplicate_flags, normalize_title, title_similarity,
    TITLE_SIMILARITY_THRESHOLD,
};
pub use http::{HttpClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use rate_limit::RateLimiter;
