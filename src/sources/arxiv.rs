//! arXiv research source implementation.

use async_trait::async_trait;
use chrono::Datelike;
use feed_rs::parser;

use crate::config::Config;
use crate::models::{Paper, PaperBuilder, SearchQuery, SearchResponse, SortBy, SourceType};
use crate::sources::{ensure_success, Source, SourceCapabilities, SourceError};
use crate::utils::HttpClient;

/// Base URL for the arXiv export API
const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";
/// Base URL for arXiv PDFs
const ARXIV_PDF_URL: &str = "https://arxiv.org/pdf";
/// Base URL for arXiv abstract pages
const ARXIV_ABS_URL: &str = "https://arxiv.org/abs";
/// Largest page the adapter requests
const MAX_RESULTS: usize = 100;

/// arXiv research source
///
/// Supports:
/// - Search by query, with an optional submission-year window
/// - Sorting by relevance or submission date
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    base_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source against the public API
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: ARXIV_API_URL.to_string(),
        })
    }

    /// Create from configuration (endpoint and timeouts)
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::from_config(&config.http)?,
            base_url: config.endpoints.arxiv.clone(),
        })
    }

    /// Point the adapter at a different endpoint (mock servers in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parse an arXiv ID from various formats
    ///
    /// Handles formats like:
    /// - "2301.12345"
    /// - "2301.12345v1" (version is stripped)
    /// - "arxiv:2301.12345"
    /// - "https://arxiv.org/abs/2301.12345v1"
    pub fn parse_id(id: &str) -> Result<String, SourceError> {
        let id = id.trim();

        let id = match id.find("/abs/") {
            Some(pos) => &id[pos + 5..],
            None => match id.get(..6) {
                Some(prefix) if prefix.eq_ignore_ascii_case("arxiv:") => &id[6..],
                _ => id,
            },
        };
        let id = id.trim_end_matches('/');

        let id = match id.rsplit_once('v') {
            Some((base, version))
                if !base.is_empty()
                    && !version.is_empty()
                    && version.chars().all(|c| c.is_ascii_digit()) =>
            {
                base
            }
            _ => id,
        };

        if id.is_empty() {
            return Err(SourceError::InvalidRequest("Empty arXiv ID".to_string()));
        }

        Ok(id.to_string())
    }

    /// Translate a year expression into a `submittedDate` range
    fn submitted_date_filter(year: &str) -> Option<String> {
        let year = year.trim();
        let (start, end) = if let Some(after) = year.strip_prefix('>') {
            (after.parse::<i32>().ok()? + 1, 9999)
        } else if let Some(before) = year.strip_prefix('<') {
            (1900, before.parse::<i32>().ok()? - 1)
        } else if let Some(until) = year.strip_prefix('-') {
            (1900, until.parse().ok()?)
        } else if let Some(from) = year.strip_suffix('-') {
            (from.parse().ok()?, 9999)
        } else if let Some((from, to)) = year.split_once('-') {
            (from.parse().ok()?, to.parse().ok()?)
        } else {
            let single = year.parse().ok()?;
            (single, single)
        };

        Some(format!(
            "submittedDate:[{:04}01010000 TO {:04}12312359]",
            start, end
        ))
    }

    /// Build search query for arXiv API
    fn build_search_query(query: &SearchQuery) -> String {
        let mut parts = Vec::new();

        if !query.query.trim().is_empty() {
            parts.push(format!("all:{}", query.query.trim()));
        }

        if let Some(filter) = query.year.as_deref().and_then(Self::submitted_date_filter) {
            parts.push(filter);
        }

        if parts.is_empty() {
            "all:*".to_string()
        } else {
            parts.join(" AND ")
        }
    }

    fn sort_param(sort: SortBy) -> &'static str {
        match sort {
            SortBy::Relevance => "relevance",
            SortBy::PublicationDate => "submittedDate",
            // arXiv has no citation data
            SortBy::CitationCount => "relevance",
        }
    }

    /// Parse arXiv Atom feed entry into Paper
    fn parse_entry(entry: &feed_rs::model::Entry) -> Result<Paper, SourceError> {
        let paper_id = Self::parse_id(&entry.id)
            .map_err(|_| SourceError::Parse("Missing paper ID".to_string()))?;

        let title = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default();

        let authors = entry.authors.iter().map(|a| a.name.trim().to_string());

        let pdf_url = entry
            .links
            .iter()
            .find(|l| {
                l.title.as_deref() == Some("pdf")
                    || l.media_type.as_deref() == Some("application/pdf")
            })
            .map(|l| l.href.clone())
            .unwrap_or_else(|| format!("{}/{}", ARXIV_PDF_URL, paper_id));

        let doi = entry
            .links
            .iter()
            .find(|l| l.title.as_deref() == Some("doi"))
            .map(|l| l.href.clone());

        let mut builder = PaperBuilder::new(paper_id.clone(), title, SourceType::Arxiv)
            .authors(authors)
            .arxiv_id(paper_id.clone())
            .url(format!("{}/{}", ARXIV_ABS_URL, paper_id))
            .open_access(true, Some(pdf_url))
            .work_type("preprint")
            .topics(entry.categories.iter().map(|c| c.term.clone()));

        if let Some(summary) = &entry.summary {
            builder = builder.abstract_text(collapse_whitespace(&summary.content));
        }
        if let Some(published) = entry.published {
            builder = builder
                .year(published.year())
                .published_date(published.format("%Y-%m-%d").to_string());
        }
        if let Some(doi) = doi {
            builder = builder.doi(doi);
        }

        Ok(builder.build())
    }

    /// arXiv reports malformed queries as a single entry titled "Error"
    fn api_error(feed: &feed_rs::model::Feed) -> Option<String> {
        let [entry] = feed.entries.as_slice() else {
            return None;
        };
        let is_error = entry
            .title
            .as_ref()
            .is_some_and(|t| t.content.trim() == "Error");
        is_error.then(|| {
            entry
                .summary
                .as_ref()
                .map(|s| collapse_whitespace(&s.content))
                .unwrap_or_else(|| "arXiv rejected the query".to_string())
        })
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Arxiv
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let search_query = Self::build_search_query(query);
        let max_results = query.max_results.clamp(1, MAX_RESULTS);
        let sort_by = Self::sort_param(query.sort_by);

        tracing::debug!(
            search_query = %search_query,
            max_results,
            sort_by,
            "arXiv request"
        );

        let max_results_param = max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results_param.as_str()),
                ("sortBy", sort_by),
                ("sortOrder", "descending"),
            ])
            .header("Accept", "application/atom+xml")
            .send()
            .await?;

        let bytes = ensure_success(response, self.name())?.bytes().await?;

        let feed = parser::parse(bytes.as_ref())
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        if let Some(message) = Self::api_error(&feed) {
            return Err(SourceError::Api(message));
        }

        let papers = feed
            .entries
            .iter()
            .map(Self::parse_entry)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(Paper::has_title)
            .collect::<Vec<_>>();

        tracing::debug!(count = papers.len(), "arXiv results parsed");

        Ok(SearchResponse::new(papers, SourceType::Arxiv, &query.query))
    }
}
