//! OpenAlex research source implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{Paper, PaperBuilder, SearchQuery, SearchResponse, SortBy, SourceType};
use crate::sources::{ensure_success, Source, SourceCapabilities, SourceError};
use crate::utils::HttpClient;

const OPENALEX_API_BASE: &str = "https://api.openalex.org";
/// OpenAlex caps `per_page` at 200
const MAX_PER_PAGE: usize = 200;

/// OpenAlex research source
///
/// Uses the OpenAlex REST API (`/works`). Supplying a contact email puts
/// requests in the faster "polite pool".
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    base_url: String,
    email: Option<String>,
}

impl OpenAlexSource {
    /// Create a new OpenAlex source against the public API
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: OPENALEX_API_BASE.to_string(),
            email: None,
        })
    }

    /// Create from configuration (endpoint, timeouts, polite-pool email)
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::from_config(&config.http)?,
            base_url: config.endpoints.openalex.trim_end_matches('/').to_string(),
            email: config.api_keys.openalex_email.clone(),
        })
    }

    /// Set the polite-pool contact email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Point the adapter at a different endpoint (mock servers in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn sort_param(sort: SortBy) -> &'static str {
        match sort {
            SortBy::Relevance => "relevance_score:desc",
            SortBy::PublicationDate => "publication_date:desc",
            SortBy::CitationCount => "cited_by_count:desc",
        }
    }

    /// Comma-joined `filter` value, `None` when no filter applies
    fn build_filter(query: &SearchQuery) -> Option<String> {
        let mut filters = Vec::new();

        if let Some(year) = query.year.as_deref().filter(|y| !y.trim().is_empty()) {
            filters.push(format!("publication_year:{}", year.trim()));
        }
        if query.open_access_only {
            filters.push("is_oa:true".to_string());
        }
        // a zero minimum filters nothing
        if let Some(min) = query.min_citations.filter(|m| *m > 0) {
            filters.push(format!("cited_by_count:>{}", min - 1));
        }

        (!filters.is_empty()).then(|| filters.join(","))
    }

    /// Query parameters for a `/works` search
    fn build_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("search", query.query.clone()),
            (
                "per_page",
                query.max_results.clamp(1, MAX_PER_PAGE).to_string(),
            ),
            ("sort", Self::sort_param(query.sort_by).to_string()),
        ];

        if let Some(email) = &self.email {
            params.push(("mailto", email.clone()));
        }
        if let Some(filter) = Self::build_filter(query) {
            params.push(("filter", filter));
        }

        params
    }

    /// Parse OpenAlex work data
    fn parse_work(work: OAWork) -> Paper {
        let title = work
            .title
            .filter(|t| !t.trim().is_empty())
            .or(work.display_name)
            .unwrap_or_default();

        let authors = work
            .authorships
            .into_iter()
            .filter_map(|a| a.author.and_then(|author| author.display_name));

        let venue = work
            .primary_location
            .and_then(|loc| loc.source)
            .and_then(|src| src.display_name);

        let topics = work
            .topics
            .into_iter()
            .filter_map(|t| t.display_name)
            .filter(|name| !name.is_empty())
            .take(2);

        let source_id = work.id.clone().unwrap_or_default();

        let mut builder = PaperBuilder::new(source_id, title, SourceType::OpenAlex)
            .authors(authors)
            .topics(topics)
            .citations(work.cited_by_count.unwrap_or(0));

        if let Some(id) = work.id {
            builder = builder.url(id);
        }
        if let Some(doi) = work.doi {
            builder = builder.doi(doi);
        }
        if let Some(year) = work.publication_year {
            builder = builder.year(year);
        }
        if let Some(date) = work.publication_date {
            builder = builder.published_date(date);
        }
        if let Some(venue) = venue {
            builder = builder.venue(venue);
        }
        if let Some(work_type) = work.work_type.filter(|t| !t.is_empty()) {
            builder = builder.work_type(work_type);
        }
        if let Some(oa) = work.open_access {
            builder = builder.open_access(oa.is_oa, oa.oa_url);
            if let Some(status) = oa.oa_status {
                builder = builder.oa_status(status);
            }
        }

        builder.build()
    }
}

#[async_trait]
impl Source for OpenAlexSource {
    fn id(&self) -> &str {
        "openalex"
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    fn source_type(&self) -> SourceType {
        SourceType::OpenAlex
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::DOI_LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let params = self.build_params(query);
        tracing::debug!(?params, "OpenAlex request");

        let response = self
            .client
            .get(&format!("{}/works", self.base_url))
            .query(&params)
            .send()
            .await?;

        let data: WorksResponse = ensure_success(response, self.name())?.json().await?;

        let papers: Vec<Paper> = data
            .results
            .into_iter()
            .map(Self::parse_work)
            .filter(Paper::has_title)
            .collect();

        let mut response = SearchResponse::new(papers, SourceType::OpenAlex, &query.query);
        if let Some(count) = data.meta.and_then(|m| m.count) {
            response = response.total_results(count);
        }
        Ok(response)
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Paper, SourceError> {
        let url = format!("{}/works/doi:{}", self.base_url, doi.trim());

        let mut request = self.client.get(&url);
        if let Some(email) = &self.email {
            request = request.query(&[("mailto", email)]);
        }

        let response = request.send().await?;
        let work: OAWork = ensure_success(response, self.name())?.json().await?;
        let paper = Self::parse_work(work);

        if paper.has_title() {
            Ok(paper)
        } else {
            Err(SourceError::NotFound(format!("DOI {} has no title", doi)))
        }
    }
}

// ===== OpenAlex API Types =====

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<OAWork>,
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OAWork {
    id: Option<String>,
    title: Option<String>,
    display_name: Option<String>,
    doi: Option<String>,
    publication_year: Option<i32>,
    publication_date: Option<String>,
    cited_by_count: Option<u32>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    #[serde(default)]
    authorships: Vec<OAAuthorship>,
    primary_location: Option<OALocation>,
    open_access: Option<OAOpenAccess>,
    #[serde(default)]
    topics: Vec<OATopic>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorship {
    author: Option<OAAuthor>,
}

#[derive(Debug, Deserialize)]
struct OAAuthor {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OALocation {
    source: Option<OASource>,
}

#[derive(Debug, Deserialize)]
struct OASource {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAOpenAccess {
    #[serde(default)]
    is_oa: bool,
    oa_url: Option<String>,
    oa_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OATopic {
    display_name: Option<String>,
}
