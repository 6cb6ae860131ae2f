//! Semantic Scholar research source implementation.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{Paper, PaperBuilder, SearchQuery, SearchResponse, SortBy, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{HttpClient, RateLimiter};

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

/// Fields requested for every paper
const PAPER_FIELDS: &str = "paperId,title,abstract,year,authors,citationCount,\
influentialCitationCount,venue,publicationDate,isOpenAccess,openAccessPdf,url,\
externalIds,fieldsOfStudy";

/// Largest page `paper/search` accepts
const MAX_LIMIT: usize = 100;

const RATE_LIMIT_MESSAGE: &str =
    "Semantic Scholar rate limit reached (100 requests/5 minutes without an API key)";

/// Semantic Scholar research source
///
/// Uses the Graph API. Every request first waits on the adapter's own
/// [`RateLimiter`]; an API key, when configured, is sent as `x-api-key`.
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    limiter: RateLimiter,
}

impl SemanticScholarSource {
    /// Create a new Semantic Scholar source (1 request/second, no key)
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: SEMANTIC_API_BASE.to_string(),
            api_key: None,
            limiter: RateLimiter::per_second(1.0),
        })
    }

    /// Create from configuration (endpoint, timeouts, key, request rate)
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::from_config(&config.http)?,
            base_url: config
                .endpoints
                .semantic_scholar
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_keys.semantic_scholar.clone(),
            limiter: RateLimiter::per_second(
                config.rate_limits.semantic_scholar_requests_per_second,
            ),
        })
    }

    /// Set the API key (optional, for higher rate limits)
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point the adapter at a different endpoint (mock servers in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the request limiter
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Translate a year expression into the API's `year` syntax
    ///
    /// `>2020` becomes `2021-`, `<2020` becomes `-2019`; other forms pass through.
    fn year_param(year: &str) -> String {
        let year = year.trim();
        if let Some(after) = year.strip_prefix('>').and_then(|y| y.parse::<i32>().ok()) {
            format!("{}-", after + 1)
        } else if let Some(before) = year.strip_prefix('<').and_then(|y| y.parse::<i32>().ok()) {
            format!("-{}", before - 1)
        } else {
            year.to_string()
        }
    }

    fn sort_param(sort: SortBy) -> Option<&'static str> {
        match sort {
            SortBy::Relevance => None,
            SortBy::PublicationDate => Some("publicationDate:desc"),
            SortBy::CitationCount => Some("citationCount:desc"),
        }
    }

    /// Query parameters for a search; relevance uses `paper/search`, other sorts the bulk endpoint
    fn build_search(&self, query: &SearchQuery) -> (String, Vec<(&'static str, String)>) {
        let limit = query.max_results.clamp(1, MAX_LIMIT);
        let mut params = vec![
            ("query", query.query.clone()),
            ("fields", PAPER_FIELDS.to_string()),
        ];

        if let Some(year) = query.year.as_deref().filter(|y| !y.trim().is_empty()) {
            params.push(("year", Self::year_param(year)));
        }
        if let Some(min) = query.min_citations {
            params.push(("minCitationCount", min.to_string()));
        }
        if let Some(fields) = query.fields_of_study.as_deref().filter(|f| !f.is_empty()) {
            params.push(("fieldsOfStudy", fields.to_string()));
        }
        if query.open_access_only {
            params.push(("openAccessPdf", String::new()));
        }

        let url = match Self::sort_param(query.sort_by) {
            Some(sort) => {
                params.push(("sort", sort.to_string()));
                format!("{}/paper/search/bulk", self.base_url)
            }
            None => {
                params.push(("limit", limit.to_string()));
                format!("{}/paper/search", self.base_url)
            }
        };

        (url, params)
    }

    /// Rate-limited GET returning the decoded body
    async fn get_json<T>(&self, url: &str, params: &[(&str, String)]) -> Result<T, SourceError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.limiter.wait().await;

        let mut request = self.client.get(url).query(params);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SourceError::RateLimit(RATE_LIMIT_MESSAGE.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::from_status(status, self.name()));
        }

        Ok(response.json().await?)
    }

    /// `{base}/paper/{path}[/{suffix}]`, each segment percent-encoded
    ///
    /// `/` inside `path` stays a separator so DOIs keep their registrant prefix.
    fn paper_url(&self, path: &str, suffix: Option<&str>) -> Result<String, SourceError> {
        let bad_base = || SourceError::InvalidRequest(format!("invalid base URL '{}'", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| bad_base())?;
        url.path_segments_mut()
            .map_err(|_| bad_base())?
            .pop_if_empty()
            .push("paper")
            .extend(path.split('/'))
            .extend(suffix);
        Ok(url.into())
    }

    async fn lookup(&self, path: &str) -> Result<Paper, SourceError> {
        let url = self.paper_url(path, None)?;
        let data: S2Paper = self
            .get_json(&url, &[("fields", PAPER_FIELDS.to_string())])
            .await?;

        Self::parse_paper(data)
            .ok_or_else(|| SourceError::NotFound(format!("paper/{} has no title", path)))
    }

    /// Parse Semantic Scholar paper data; records without a title are dropped
    fn parse_paper(data: S2Paper) -> Option<Paper> {
        let title = data.title.filter(|t| !t.trim().is_empty())?;
        let paper_id = data.paper_id.unwrap_or_default();

        let authors = data.authors.into_iter().filter_map(|a| a.name);
        let external = data.external_ids.unwrap_or_default();
        let pdf_url = data.open_access_pdf.and_then(|p| p.url);

        let mut builder = PaperBuilder::new(paper_id, title, SourceType::SemanticScholar)
            .authors(authors)
            .citations(data.citation_count.unwrap_or(0))
            .influential_citations(data.influential_citation_count.unwrap_or(0))
            .open_access(data.is_open_access.unwrap_or(false), pdf_url)
            .topics(data.fields_of_study.unwrap_or_default());

        if let Some(abstract_text) = data.r#abstract {
            builder = builder.abstract_text(abstract_text);
        }
        if let Some(year) = data.year {
            builder = builder.year(year);
        }
        if let Some(date) = data.publication_date {
            builder = builder.published_date(date);
        }
        if let Some(venue) = data.venue {
            builder = builder.venue(venue);
        }
        if let Some(url) = data.url {
            builder = builder.url(url);
        }
        if let Some(doi) = external.doi {
            builder = builder.doi(doi);
        }
        if let Some(arxiv) = external.arxiv {
            builder = builder.arxiv_id(arxiv);
        }

        Some(builder.build())
    }
}

#[async_trait]
impl Source for SemanticScholarSource {
    fn id(&self) -> &str {
        "semantic_scholar"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    fn source_type(&self) -> SourceType {
        SourceType::SemanticScholar
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
            | SourceCapabilities::CITATIONS
            | SourceCapabilities::DOI_LOOKUP
            | SourceCapabilities::ARXIV_LOOKUP
            | SourceCapabilities::TITLE_LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let (url, params) = self.build_search(query);
        tracing::debug!(%url, ?params, "Semantic Scholar request");

        let data: S2SearchResponse = self.get_json(&url, &params).await?;

        let papers: Vec<Paper> = data
            .data
            .into_iter()
            .filter_map(Self::parse_paper)
            .take(query.max_results.clamp(1, MAX_LIMIT))
            .collect();

        let mut response = SearchResponse::new(papers, SourceType::SemanticScholar, &query.query);
        if let Some(total) = data.total {
            response = response.total_results(total);
        }
        Ok(response)
    }

    async fn search_by_title(&self, title: &str) -> Result<Paper, SourceError> {
        let url = format!("{}/paper/search", self.base_url);
        let params = [
            ("query", title.to_string()),
            ("fields", PAPER_FIELDS.to_string()),
            ("limit", "1".to_string()),
        ];

        let data: S2SearchResponse = self.get_json(&url, &params).await?;
        data.data
            .into_iter()
            .find_map(Self::parse_paper)
            .ok_or_else(|| SourceError::NotFound(format!("No paper titled '{}'", title)))
    }

    async fn get_by_id(&self, id: &str) -> Result<Paper, SourceError> {
        self.lookup(id.trim()).await
    }

    async fn get_by_arxiv_id(&self, arxiv_id: &str) -> Result<Paper, SourceError> {
        self.lookup(&format!("arXiv:{}", arxiv_id.trim())).await
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Paper, SourceError> {
        self.lookup(&format!("DOI:{}", doi.trim())).await
    }

    async fn get_references(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>, SourceError> {
        let url = self.paper_url(paper_id, Some("references"))?;
        let params = [
            ("fields", PAPER_FIELDS.to_string()),
            ("limit", limit.to_string()),
        ];

        let data: S2EdgeResponse = self.get_json(&url, &params).await?;
        let papers: Vec<Paper> = data
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|edge| edge.cited_paper)
            .filter_map(Self::parse_paper)
            .collect();

        tracing::debug!(paper_id, count = papers.len(), "references fetched");
        Ok(papers)
    }

    async fn get_citations(&self, paper_id: &str, limit: usize) -> Result<Vec<Paper>, SourceError> {
        let url = self.paper_url(paper_id, Some("citations"))?;
        let params = [
            ("fields", PAPER_FIELDS.to_string()),
            ("limit", limit.to_string()),
        ];

        let data: S2EdgeResponse = self.get_json(&url, &params).await?;
        let papers: Vec<Paper> = data
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|edge| edge.citing_paper)
            .filter_map(Self::parse_paper)
            .collect();

        tracing::debug!(paper_id, count = papers.len(), "citations fetched");
        Ok(papers)
    }
}

// ===== Semantic Scholar API Types =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    title: Option<String>,
    r#abstract: Option<String>,
    year: Option<i32>,
    citation_count: Option<u32>,
    influential_citation_count: Option<u32>,
    venue: Option<String>,
    publication_date: Option<String>,
    is_open_access: Option<bool>,
    open_access_pdf: Option<S2OpenAccessPdf>,
    url: Option<String>,
    external_ids: Option<S2ExternalIds>,
    fields_of_study: Option<Vec<String>>,
    #[serde(default)]
    authors: Vec<S2Author>,
}

#[derive(Debug, Default, Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2OpenAccessPdf {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2SearchResponse {
    total: Option<u64>,
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[derive(Debug, Deserialize)]
struct S2EdgeResponse {
    data: Option<Vec<S2Edge>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Edge {
    cited_paper: Option<S2Paper>,
    citing_paper: Option<S2Paper>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PAPER: &str = r#"{
        "paperId": "204e3073870fae3d05bcbc2f6a8e263d9b72e776",
        "title": "Attention is All you Need",
        "year": 2017,
        "citationCount": 90000,
        "influentialCitationCount": 9000,
        "venue": "Neural Information Processing Systems",
        "publicationDate": "2017-06-12",
        "isOpenAccess": true,
        "openAccessPdf": {"url": "https://arxiv.org/pdf/1706.03762"},
        "url": "https://www.semanticscholar.org/paper/204e3073870fae3d05bcbc2f6a8e263d9b72e776",
        "externalIds": {"DOI": "10.48550/arXiv.1706.03762", "ArXiv": "1706.03762"},
        "fieldsOfStudy": ["Computer Science"],
        "authors": [{"name": "Ashish Vaswani"}, {"name": "Noam Shazeer"}]
    }"#;

    fn source(server: &mockito::Server) -> SemanticScholarSource {
        SemanticScholarSource::new()
            .unwrap()
            .with_base_url(server.url())
            .with_rate_limiter(RateLimiter::unlimited())
    }

    #[test]
    fn test_year_param() {
        assert_eq!(SemanticScholarSource::year_param(">2020"), "2021-");
        assert_eq!(SemanticScholarSource::year_param("<2020"), "-2019");
        assert_eq!(SemanticScholarSource::year_param("2020-2023"), "2020-2023");
        assert_eq!(SemanticScholarSource::year_param("2023"), "2023");
    }

    #[test]
    fn test_build_search_relevance_and_bulk() {
        let source = SemanticScholarSource::new().unwrap();

        let (url, params) = source.build_search(
            &SearchQuery::new("deep learning")
                .max_results(20)
                .min_citations(100)
                .fields_of_study("Computer Science")
                .open_access_only(true),
        );
        assert!(url.ends_with("/paper/search"));
        assert!(params.contains(&("limit", "20".to_string())));
        assert!(params.contains(&("minCitationCount", "100".to_string())));
        assert!(params.contains(&("fieldsOfStudy", "Computer Science".to_string())));
        assert!(params.iter().any(|(k, _)| *k == "openAccessPdf"));

        let (url, params) =
            source.build_search(&SearchQuery::new("x").sort_by(SortBy::CitationCount));
        assert!(url.ends_with("/paper/search/bulk"));
        assert!(params.contains(&("sort", "citationCount:desc".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "limit"));
    }

    #[test]
    fn test_parse_paper() {
        let data: S2Paper = serde_json::from_str(PAPER).unwrap();
        let paper = SemanticScholarSource::parse_paper(data).unwrap();

        assert_eq!(paper.source_id, "204e3073870fae3d05bcbc2f6a8e263d9b72e776");
        assert_eq!(paper.doi.as_deref(), Some("10.48550/arXiv.1706.03762"));
        assert_eq!(paper.arxiv_id.as_deref(), Some("1706.03762"));
        assert_eq!(paper.citation_count, 90000);
        assert_eq!(paper.influential_citation_count, 9000);
        assert!(paper.is_open_access);
        assert_eq!(paper.authors.len(), 2);
        assert_eq!(paper.topics, vec!["Computer Science"]);
    }

    #[test]
    fn test_parse_paper_without_title_is_dropped() {
        let data: S2Paper = serde_json::from_str(r#"{"paperId": "x", "title": null}"#).unwrap();
        assert!(SemanticScholarSource::parse_paper(data).is_none());
    }

    #[tokio::test]
    async fn test_search_sends_filters_and_key() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(r#"{{"total": 1, "offset": 0, "data": [{}]}}"#, PAPER);
        let mock = server
            .mock("GET", "/paper/search")
            .match_header("x-api-key", "secret")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "deep learning".into()),
                Matcher::UrlEncoded("minCitationCount".into(), "100".into()),
                Matcher::UrlEncoded("year".into(), "2021-".into()),
            ]))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let response = source(&server)
            .with_api_key("secret")
            .search(
                &SearchQuery::new("deep learning")
                    .year(">2020")
                    .min_citations(100),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.total_results, Some(1));
        assert_eq!(response.papers[0].title, "Attention is All you Need");
    }

    #[tokio::test]
    async fn test_bulk_search_truncates_to_limit() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            r#"{{"total": 3, "token": "t", "data": [{0}, {0}, {0}]}}"#,
            PAPER
        );
        let _mock = server
            .mock("GET", "/paper/search/bulk")
            .match_query(Matcher::UrlEncoded(
                "sort".into(),
                "publicationDate:desc".into(),
            ))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let response = source(&server)
            .search(
                &SearchQuery::new("x")
                    .max_results(2)
                    .sort_by(SortBy::PublicationDate),
            )
            .await
            .unwrap();
        assert_eq!(response.papers.len(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = source(&server)
            .search(&SearchQuery::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::RateLimit(_)));
        assert!(err.to_string().contains("100 requests/5 minutes"));
    }

    #[test]
    fn test_paper_url_encodes_segments() {
        let source = SemanticScholarSource::new().unwrap();
        assert_eq!(
            source.paper_url("DOI:10.1000/a?b#c d", None).unwrap(),
            "https://api.semanticscholar.org/graph/v1/paper/DOI:10.1000/a%3Fb%23c%20d"
        );
        assert_eq!(
            source.paper_url("abc123", Some("references")).unwrap(),
            "https://api.semanticscholar.org/graph/v1/paper/abc123/references"
        );

        let local = source.with_base_url("http://127.0.0.1:9/");
        assert_eq!(
            local.paper_url("arXiv:1706.03762", Some("citations")).unwrap(),
            "http://127.0.0.1:9/paper/arXiv:1706.03762/citations"
        );
    }

    #[test]
    fn test_paper_url_rejects_bad_base() {
        let source = SemanticScholarSource::new().unwrap().with_base_url("not a url");
        assert!(matches!(
            source.paper_url("x", None),
            Err(SourceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_lookups_use_prefixed_paths() {
        let mut server = mockito::Server::new_async().await;
        let arxiv = server
            .mock("GET", "/paper/arXiv:1706.03762")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(PAPER)
            .create_async()
            .await;
        let doi = server
            .mock("GET", "/paper/DOI:10.1000/xyz")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let source = source(&server);
        let paper = source.get_by_arxiv_id("1706.03762").await.unwrap();
        assert_eq!(paper.title, "Attention is All you Need");

        let err = source.get_by_doi("10.1000/xyz").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));

        arxiv.assert_async().await;
        doi.assert_async().await;
    }

    #[tokio::test]
    async fn test_references_and_citations_unwrap_edges() {
        let mut server = mockito::Server::new_async().await;
        let refs_body = format!(
            r#"{{"data": [{{"citedPaper": {}}}, {{"citedPaper": null}}, {{"citedPaper": {{"paperId": "y", "title": null}}}}]}}"#,
            PAPER
        );
        let _refs = server
            .mock("GET", "/paper/abc/references")
            .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
            .with_status(200)
            .with_body(refs_body)
            .create_async()
            .await;
        let cites_body = format!(r#"{{"data": [{{"citingPaper": {}}}]}}"#, PAPER);
        let _cites = server
            .mock("GET", "/paper/abc/citations")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(cites_body)
            .create_async()
            .await;

        let source = source(&server);
        assert_eq!(source.get_references("abc", 100).await.unwrap().len(), 1);
        assert_eq!(source.get_citations("abc", 100).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_null_edge_list_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/paper/abc/references")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": null}"#)
            .create_async()
            .await;

        assert!(source(&server)
            .get_references("abc", 10)
            .await
            .unwrap()
            .is_empty());
    }
}
