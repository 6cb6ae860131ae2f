//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{Paper, PaperBuilder, SearchQuery, SearchResponse, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};

/// A mock source that returns canned results
///
/// Stands in for any [`SourceType`]. Configure it before registering; the
/// call counter is shared between clones.
#[derive(Debug, Clone)]
pub struct MockSource {
    source_type: SourceType,
    papers: Vec<Paper>,
    error: Option<SourceError>,
    delay: Option<Duration>,
    panic_on_search: bool,
    lookup: Option<Paper>,
    references: Vec<Paper>,
    citations: Vec<Paper>,
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    /// Create a mock that answers every search with zero results
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            papers: Vec::new(),
            error: None,
            delay: None,
            panic_on_search: false,
            lookup: None,
            references: Vec::new(),
            citations: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Papers returned by `search`
    pub fn with_papers(mut self, papers: Vec<Paper>) -> Self {
        self.papers = papers;
        self
    }

    /// Fail every call with `error`
    pub fn with_error(mut self, error: SourceError) -> Self {
        self.error = Some(error);
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Panic inside `search`
    pub fn panicking(mut self) -> Self {
        self.panic_on_search = true;
        self
    }

    /// Paper returned by lookups whose key matches its DOI, arXiv ID, native ID or title
    pub fn with_lookup(mut self, paper: Paper) -> Self {
        self.lookup = Some(paper);
        self
    }

    /// Reference and citation lists returned for the lookup paper
    pub fn with_network(mut self, references: Vec<Paper>, citations: Vec<Paper>) -> Self {
        self.references = references;
        self.citations = citations;
        self
    }

    /// Number of trait calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn find(&self, matches: impl Fn(&Paper) -> bool) -> Result<Paper, SourceError> {
        self.lookup
            .iter()
            .find(|paper| matches(paper))
            .cloned()
            .ok_or_else(|| SourceError::NotFound("mock has no such paper".to_string()))
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        self.source_type.id()
    }

    fn name(&self) -> &str {
        self.source_type.name()
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn capabilities(&self) -> SourceCapabilities {
        match self.source_type {
            SourceType::SemanticScholar => SourceCapabilities::all(),
            SourceType::OpenAlex => SourceCapabilities::SEARCH | SourceCapabilities::DOI_LOOKUP,
            SourceType::Arxiv => SourceCapabilities::SEARCH,
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        self.enter().await?;
        if self.panic_on_search {
            panic!("mock source configured to panic");
        }

        let papers: Vec<Paper> = self
            .papers
            .iter()
            .take(query.max_results)
            .cloned()
            .collect();
        let total = papers.len() as u64;
        Ok(SearchResponse::new(papers, self.source_type, &query.query).total_results(total))
    }

    async fn search_by_title(&self, title: &str) -> Result<Paper, SourceError> {
        self.enter().await?;
        self.find(|p| p.title.eq_ignore_ascii_case(title.trim()))
    }

    async fn get_by_id(&self, id: &str) -> Result<Paper, SourceError> {
        self.enter().await?;
        let id = id.trim().trim_start_matches("CorpusId:");
        self.find(|p| p.source_id == id)
    }

    async fn get_by_arxiv_id(&self, arxiv_id: &str) -> Result<Paper, SourceError> {
        self.enter().await?;
        self.find(|p| p.arxiv_id.as_deref() == Some(arxiv_id))
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Paper, SourceError> {
        self.enter().await?;
        self.find(|p| {
            p.doi
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(doi))
        })
    }

    async fn get_references(&self, _paper_id: &str, limit: usize) -> Result<Vec<Paper>, SourceError> {
        self.enter().await?;
        Ok(self.references.iter().take(limit).cloned().collect())
    }

    async fn get_citations(&self, _paper_id: &str, limit: usize) -> Result<Vec<Paper>, SourceError> {
        self.enter().await?;
        Ok(self.citations.iter().take(limit).cloned().collect())
    }
}

/// Helper function to create a mock paper for testing
pub fn make_paper(source_id: &str, title: &str, source_type: SourceType) -> Paper {
    PaperBuilder::new(source_id, title, source_type)
        .url(format!("http://example.com/{}", source_id))
        .build()
}
