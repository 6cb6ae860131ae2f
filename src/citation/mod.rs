//! Citation-network analysis.
//!
//! identify paper → fetch references and citations → score → sort → truncate.
//! Reference and citation lists are ranked in different modes, so their
//! scores are not comparable with each other.

mod identify;
mod report;
mod scoring;

pub use identify::{
    extract_arxiv_id, extract_doi, identification_plan, identify_paper, looks_like_native_id,
    Lookup,
};
pub use report::{mermaid_graph, render_network};
pub use scoring::{
    calculate_citation_score, calculate_citation_score_at, calculate_reference_score,
    is_top_venue, rank_papers, rank_papers_at, RankingMode, CITATION_REFERENCE_YEAR, TOP_VENUES,
};

use std::sync::Arc;

use crate::config::Config;
use crate::models::{CitationNetworkRequest, Paper};
use crate::sources::Source;

/// How many references/citations are fetched before ranking
pub const DEFAULT_FETCH_LIMIT: usize = 100;

/// Result of a citation-network analysis
#[derive(Debug, Clone, PartialEq)]
pub enum CitationNetwork {
    /// No identification strategy matched
    NotFound { identifier: String },
    /// The paper exists but has neither references nor citations
    NoCitationData { paper: Paper },
    /// Ranked and truncated lists
    Ranked {
        paper: Paper,
        references: Vec<Paper>,
        citations: Vec<Paper>,
    },
}

impl CitationNetwork {
    pub fn paper(&self) -> Option<&Paper> {
        match self {
            CitationNetwork::NotFound { .. } => None,
            CitationNetwork::NoCitationData { paper } | CitationNetwork::Ranked { paper, .. } => {
                Some(paper)
            }
        }
    }

    pub fn to_markdown(&self) -> String {
        render_network(self)
    }
}

impl std::fmt::Display for CitationNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

/// Runs the citation pipeline against one citation-capable source
#[derive(Debug, Clone)]
pub struct CitationAnalyzer {
    source: Arc<dyn Source>,
    reference_year: i32,
    fetch_limit: usize,
}

impl CitationAnalyzer {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            source,
            reference_year: CITATION_REFERENCE_YEAR,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }

    pub fn from_config(source: Arc<dyn Source>, config: &Config) -> Self {
        Self::new(source)
            .with_reference_year(config.citation.reference_year)
            .with_fetch_limit(config.citation.fetch_limit)
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit.max(1);
        self
    }

    /// Analyze the paper named by `request`
    ///
    /// Failures to fetch either list are logged and treated as an empty list.
    pub async fn analyze(&self, request: &CitationNetworkRequest) -> CitationNetwork {
        let identifier = request.paper_identifier.trim();
        tracing::info!(identifier, "citation analysis started");

        let Some(paper) = identify_paper(self.source.as_ref(), identifier).await else {
            return CitationNetwork::NotFound {
                identifier: identifier.to_string(),
            };
        };

        let (references, citations) = tokio::join!(
            self.source.get_references(&paper.source_id, self.fetch_limit),
            self.source.get_citations(&paper.source_id, self.fetch_limit),
        );
        let references = references.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "reference lookup failed");
            Vec::new()
        });
        let citations = citations.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "citation lookup failed");
            Vec::new()
        });

        if references.is_empty() && citations.is_empty() {
            return CitationNetwork::NoCitationData { paper };
        }

        let mut references = rank_papers_at(references, RankingMode::Reference, self.reference_year);
        references.truncate(request.max_references);
        let mut citations = rank_papers_at(citations, RankingMode::Citation, self.reference_year);
        citations.truncate(request.max_citations);

        tracing::info!(
            references = references.len(),
            citations = citations.len(),
            "citation analysis finished"
        );

        CitationNetwork::Ranked {
            paper,
            references,
            citations,
        }
    }
}

/// One-shot helper: analyze with default settings
pub async fn analyze_citation_network(
    source: Arc<dyn Source>,
    request: &CitationNetworkRequest,
) -> CitationNetwork {
    CitationAnalyzer::new(source).analyze(request).await
}
