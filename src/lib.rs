//! # Research Scout
//!
//! Multi-source academic paper search for research agents: one query fanned
//! out to OpenAlex, arXiv and Semantic Scholar, merged and deduplicated, plus
//! citation-network ranking for a single paper.
//!
//! ## Architecture
//!
//! - [`models`]: Paper records, search queries and validated tool requests
//! - [`sources`]: The `Source` trait, error taxonomy and the three backends
//! - [`aggregator`]: Concurrent fan-out/fan-in with per-source timeouts
//! - [`citation`]: Paper identification, importance scoring and ranking
//! - [`report`]: Markdown rendering of single-source results
//! - [`mcp`]: MCP tool surface and stdio server
//! - [`utils`]: HTTP client, deduplication and rate limiting
//! - [`web`]: General web search, extraction and crawling via Tavily
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal tables for the CLI

pub mod aggregator;
pub mod citation;
pub mod config;
pub mod mcp;
pub mod models;
pub mod report;
pub mod sources;
pub mod ui;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use aggregator::{AggregateReport, Aggregator};
pub use citation::{CitationAnalyzer, CitationNetwork};
pub use models::Paper;
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
