//! Tool registry for MCP tools.
//!
//! Every tool deserializes its JSON arguments into a typed request,
//! validates it, and only then touches the network. The result is always a
//! markdown report wrapped in a JSON string; only argument problems are
//! returned as tool errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::aggregator::{Aggregator, SearchOutcome};
use crate::citation::CitationAnalyzer;
use crate::config::Config;
use crate::models::{
    AggregatedSearchRequest, ArxivSearchRequest, CitationNetworkRequest, OpenAlexSearchRequest,
    SearchQuery, SemanticScholarSearchRequest, SourceType, ValidationError, WebCrawlRequest,
    WebExtractRequest, WebMapRequest, WebSearchRequest,
};
use crate::sources::{SourceError, SourceRegistry};
use crate::web::{self, TavilyClient};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_papers_openalex")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Deserialize and validate tool arguments
fn parse_args<T, F>(args: Value, validate: F) -> Result<T, String>
where
    T: DeserializeOwned,
    F: FnOnce(&T) -> Result<(), ValidationError>,
{
    let request: T =
        serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))?;
    validate(&request).map_err(|e| format!("Invalid arguments: {}", e))?;
    Ok(request)
}

/// Run one adapter and render its outcome
async fn single_source_report(
    sources: &SourceRegistry,
    source_type: SourceType,
    query: SearchQuery,
) -> String {
    let result = match sources.get(source_type) {
        Some(source) => source.search(&query).await,
        None => Err(SourceError::InvalidRequest(format!(
            "{} is not configured",
            source_type
        ))),
    };

    if let Err(err) = &result {
        tracing::warn!(source = %source_type, error = %err, "search failed");
    }
    SearchOutcome::from_result(result).render(source_type, &query)
}

/// `search_papers_openalex`
#[derive(Debug)]
pub struct OpenAlexSearchHandler {
    sources: Arc<SourceRegistry>,
}

#[async_trait::async_trait]
impl ToolHandler for OpenAlexSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let request: OpenAlexSearchRequest = parse_args(args, OpenAlexSearchRequest::validate)?;
        let report =
            single_source_report(&self.sources, SourceType::OpenAlex, request.to_search_query())
                .await;
        Ok(Value::String(report))
    }
}

/// `search_papers_arxiv`
#[derive(Debug)]
pub struct ArxivSearchHandler {
    sources: Arc<SourceRegistry>,
}

#[async_trait::async_trait]
impl ToolHandler for ArxivSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let request: ArxivSearchRequest = parse_args(args, ArxivSearchRequest::validate)?;
        let report =
            single_source_report(&self.sources, SourceType::Arxiv, request.to_search_query()).await;
        Ok(Value::String(report))
    }
}

/// `search_papers_semantic_scholar`
#[derive(Debug)]
pub struct SemanticScholarSearchHandler {
    sources: Arc<SourceRegistry>,
}

#[async_trait::async_trait]
impl ToolHandler for SemanticScholarSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let request: SemanticScholarSearchRequest =
            parse_args(args, SemanticScholarSearchRequest::validate)?;
        let report = single_source_report(
            &self.sources,
            SourceType::SemanticScholar,
            request.to_search_query(),
        )
        .await;
        Ok(Value::String(report))
    }
}

/// `search_papers_aggregated`
#[derive(Debug)]
pub struct AggregatedSearchHandler {
    aggregator: Aggregator,
}

#[async_trait::async_trait]
impl ToolHandler for AggregatedSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let request: AggregatedSearchRequest =
            parse_args(args, AggregatedSearchRequest::validate)?;
        let report = self.aggregator.aggregate(&request).await;
        Ok(Value::String(report.to_markdown()))
    }
}

/// `analyze_citation_network`
#[derive(Debug)]
pub struct CitationNetworkHandler {
    analyzer: Option<CitationAnalyzer>,
}

#[async_trait::async_trait]
impl ToolHandler for CitationNetworkHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let request: CitationNetworkRequest = parse_args(args, CitationNetworkRequest::validate)?;
        let Some(analyzer) = &self.analyzer else {
            return Err("No citation-capable source is configured".to_string());
        };
        let network = analyzer.analyze(&request).await;
        Ok(Value::String(network.to_markdown()))
    }
}

/// The four Tavily-backed operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebAction {
    Search,
    Extract,
    Crawl,
    Map,
}

impl WebAction {
    fn label(self) -> &'static str {
        match self {
            WebAction::Search => "search",
            WebAction::Extract => "extract",
            WebAction::Crawl => "crawl",
            WebAction::Map => "map",
        }
    }
}

/// `tavily_search`, `tavily_extract`, `tavily_crawl` and `tavily_map`
#[derive(Debug)]
pub struct WebToolHandler {
    client: Option<TavilyClient>,
    action: WebAction,
}

impl WebToolHandler {
    async fn run(&self, client: &TavilyClient, args: Value) -> Result<String, String> {
        let rendered = match self.action {
            WebAction::Search => {
                let request: WebSearchRequest = parse_args(args, WebSearchRequest::validate)?;
                client
                    .search(&request)
                    .await
                    .map(|response| web::search_report(&request, &response))
            }
            WebAction::Extract => {
                let request: WebExtractRequest = parse_args(args, WebExtractRequest::validate)?;
                client
                    .extract(&request)
                    .await
                    .map(|response| web::extract_report(&response))
            }
            WebAction::Crawl => {
                let request: WebCrawlRequest = parse_args(args, WebCrawlRequest::validate)?;
                client
                    .crawl(&request)
                    .await
                    .map(|response| web::crawl_report(&request, &response))
            }
            WebAction::Map => {
                let request: WebMapRequest = parse_args(args, WebMapRequest::validate)?;
                client
                    .map(&request)
                    .await
                    .map(|response| web::map_report(&request, &response))
            }
        };

        Ok(rendered.unwrap_or_else(|err| {
            tracing::warn!(action = self.action.label(), error = %err, "web tool failed");
            web::failure_report(self.action.label(), &err)
        }))
    }
}

#[async_trait::async_trait]
impl ToolHandler for WebToolHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let Some(client) = &self.client else {
            return Err("The web client could not be initialised".to_string());
        };
        self.run(client, args).await.map(Value::String)
    }
}

/// JSON schema shared by `tavily_crawl` and `tavily_map`
fn site_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": {"type": "string", "description": "Root URL to start from"},
            "max_depth": {"type": "integer", "minimum": 1, "maximum": 5, "default": 1},
            "max_breadth": {"type": "integer", "minimum": 1, "maximum": 100, "default": 20},
            "limit": {"type": "integer", "minimum": 1, "maximum": 200, "default": 50},
            "instructions": {
                "type": "string",
                "description": "Natural-language guidance, e.g. 'only API reference pages'"
            },
            "allow_external": {"type": "boolean", "default": true}
        },
        "required": ["url"]
    })
}

/// Registry for all MCP tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
}

impl ToolRegistry {
    /// Register the paper tools over `sources` and the web tools over Tavily
    pub fn from_sources(sources: Arc<SourceRegistry>, config: &Config) -> Self {
        let mut registry = Self::default();

        registry.register(Tool {
            name: "search_papers_openalex".to_string(),
            description: "Search OpenAlex (250M+ works across all disciplines). Supports year, \
                open-access and minimum-citation filters and sorting by citations or date."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search keywords"},
                    "max_results": {"type": "integer", "minimum": 1, "maximum": 200, "default": 10},
                    "sort_by": {
                        "type": "string",
                        "enum": ["relevance", "cited_by_count", "publication_date"],
                        "default": "relevance"
                    },
                    "publication_year": {
                        "type": "string",
                        "description": "Year filter: '2023', '>2020', '<2020' or '2020-2023'"
                    },
                    "open_access_only": {"type": "boolean", "default": false},
                    "cited_by_count_min": {"type": "integer", "minimum": 0}
                },
                "required": ["query"]
            }),
            handler: Arc::new(OpenAlexSearchHandler {
                sources: sources.clone(),
            }),
        });

        registry.register(Tool {
            name: "search_papers_arxiv".to_string(),
            description: "Search arXiv preprints (physics, mathematics, computer science and \
                more). Every result is open access."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search keywords"},
                    "max_results": {"type": "integer", "minimum": 1, "maximum": 100, "default": 10},
                    "sort_by": {
                        "type": "string",
                        "enum": ["relevance", "publication_date"],
                        "default": "relevance"
                    },
                    "year": {
                        "type": "string",
                        "description": "Submission year filter: '2023', '>2020', '<2020' or '2020-2023'"
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(ArxivSearchHandler {
                sources: sources.clone(),
            }),
        });

        registry.register(Tool {
            name: "search_papers_semantic_scholar".to_string(),
            description: "Search Semantic Scholar (200M+ papers) with citation and \
                influential-citation counts. Rate limited to 1 request/second."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search keywords"},
                    "max_results": {"type": "integer", "minimum": 1, "maximum": 100, "default": 10},
                    "year_filter": {
                        "type": "string",
                        "description": "Year filter: '2023', '2020-2023', '2020-' or '-2015'"
                    },
                    "min_citation_count": {"type": "integer", "minimum": 0},
                    "fields_of_study": {
                        "type": "string",
                        "description": "Comma-separated fields, e.g. 'Computer Science,Medicine'"
                    },
                    "sort": {
                        "type": "string",
                        "enum": ["relevance", "citationCount", "publicationDate"],
                        "default": "relevance"
                    },
                    "open_access_only": {"type": "boolean", "default": false}
                },
                "required": ["query"]
            }),
            handler: Arc::new(SemanticScholarSearchHandler {
                sources: sources.clone(),
            }),
        });

        registry.register(Tool {
            name: "search_papers_aggregated".to_string(),
            description: "Search OpenAlex, arXiv and Semantic Scholar concurrently, tolerate \
                individual source failures and remove duplicates across sources."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search keywords"},
                    "max_results_per_source": {"type": "integer", "minimum": 1, "maximum": 20, "default": 5},
                    "sources": {
                        "type": "array",
                        "items": {"type": "string", "enum": ["openalex", "arxiv", "semantic_scholar"]},
                        "minItems": 1,
                        "default": ["openalex", "arxiv", "semantic_scholar"]
                    },
                    "deduplicate": {"type": "boolean", "default": true},
                    "timeout_per_source": {"type": "integer", "minimum": 10, "maximum": 60, "default": 30}
                },
                "required": ["query"]
            }),
            handler: Arc::new(AggregatedSearchHandler {
                aggregator: Aggregator::from_config(sources.clone(), config),
            }),
        });

        let citation_source = sources.citation_source().cloned();
        registry.register(Tool {
            name: "analyze_citation_network".to_string(),
            description: "Find a paper's most important references and the strongest recent \
                papers citing it, ranked by importance score, with a Mermaid citation graph."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "paper_identifier": {
                        "type": "string",
                        "description": "Paper title, DOI, arXiv ID, Semantic Scholar ID or URL"
                    },
                    "max_references": {"type": "integer", "minimum": 1, "maximum": 50, "default": 5},
                    "max_citations": {"type": "integer", "minimum": 1, "maximum": 50, "default": 5}
                },
                "required": ["paper_identifier"]
            }),
            handler: Arc::new(CitationNetworkHandler {
                analyzer: citation_source.map(|source| CitationAnalyzer::from_config(source, config)),
            }),
        });

        registry.register_web_tools(config);
        registry
    }

    fn register_web_tools(&mut self, config: &Config) {
        let client = match TavilyClient::from_config(config) {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::warn!(error = %err, "web tools disabled");
                None
            }
        };
        let handler = |action| {
            Arc::new(WebToolHandler {
                client: client.clone(),
                action,
            })
        };

        self.register(Tool {
            name: "tavily_search".to_string(),
            description: "General web search for news, blog posts, documentation and other \
                non-academic sources. Optionally returns a generated answer. Needs TAVILY_API_KEY."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"},
                    "max_results": {"type": "integer", "minimum": 1, "maximum": 20, "default": 5},
                    "search_depth": {"type": "string", "enum": ["basic", "advanced"], "default": "basic"},
                    "topic": {"type": "string", "enum": ["general", "news", "finance"], "default": "general"},
                    "time_range": {
                        "type": "string",
                        "enum": ["day", "week", "month", "year", "d", "w", "m", "y"]
                    },
                    "include_answer": {"type": "boolean", "default": false},
                    "include_raw_content": {"type": "boolean", "default": false},
                    "include_images": {"type": "boolean", "default": false},
                    "include_domains": {"type": "array", "items": {"type": "string"}},
                    "exclude_domains": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["query"]
            }),
            handler: handler(WebAction::Search),
        });

        self.register(Tool {
            name: "tavily_extract".to_string(),
            description: "Extract the readable content of one or more web pages as markdown \
                or plain text. Needs TAVILY_API_KEY."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "urls": {
                        "oneOf": [
                            {"type": "string"},
                            {"type": "array", "items": {"type": "string"}, "minItems": 1, "maxItems": 20}
                        ],
                        "description": "One URL or a list of URLs"
                    },
                    "include_images": {"type": "boolean", "default": false},
                    "extract_depth": {"type": "string", "enum": ["basic", "advanced"], "default": "advanced"},
                    "format": {"type": "string", "enum": ["markdown", "text"], "default": "markdown"}
                },
                "required": ["urls"]
            }),
            handler: handler(WebAction::Extract),
        });

        self.register(Tool {
            name: "tavily_crawl".to_string(),
            description: "Crawl a site from a root URL and return the content of the pages \
                reached. Needs TAVILY_API_KEY."
                .to_string(),
            input_schema: site_schema(),
            handler: handler(WebAction::Crawl),
        });

        self.register(Tool {
            name: "tavily_map".to_string(),
            description: "List the URLs reachable from a root URL without fetching their \
                content. Needs TAVILY_API_KEY."
                .to_string(),
            input_schema: site_schema(),
            handler: handler(WebAction::Map),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools, ordered by name
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tracing::debug!(tool = name, "executing tool");
        tool.handler.execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Paper;
    use crate::sources::MockSource;

    fn registry_with(sources: Vec<MockSource>) -> ToolRegistry {
        let mut registry = SourceRegistry::new();
        for source in sources {
            registry.register(Arc::new(source));
        }
        ToolRegistry::from_sources(Arc::new(registry), &Config::default())
    }

    fn text(value: Value) -> String {
        value.as_str().map(str::to_string).unwrap_or_default()
    }

    #[test]
    fn test_all_tools_registered() {
        let tools = registry_with(Vec::new());
        let names: Vec<&str> = tools.all().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "analyze_citation_network",
                "search_papers_aggregated",
                "search_papers_arxiv",
                "search_papers_openalex",
                "search_papers_semantic_scholar",
                "tavily_crawl",
                "tavily_extract",
                "tavily_map",
                "tavily_search",
            ]
        );
    }

    fn web_registry(server: &mockito::Server, key: Option<&str>) -> ToolRegistry {
        let mut config = Config::default();
        config.endpoints.tavily = server.url();
        config.api_keys.tavily = key.map(str::to_string);
        ToolRegistry::from_sources(Arc::new(SourceRegistry::new()), &config)
    }

    #[tokio::test]
    async fn test_web_search_tool_renders_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_header("authorization", "Bearer tvly-key")
            .with_status(200)
            .with_body(
                r#"{"answer": "An answer", "results": [
                    {"title": "Result 1", "url": "https://example.com/1", "content": "Content 1", "score": 0.95}
                ]}"#,
            )
            .create_async()
            .await;

        let tools = web_registry(&server, Some("tvly-key"));
        let report = text(
            tools
                .execute(
                    "tavily_search",
                    json!({"query": "test query", "include_answer": true}),
                )
                .await
                .unwrap(),
        );
        mock.assert_async().await;
        assert!(report.contains("Found 1 results"));
        assert!(report.contains("An answer"));
        assert!(report.contains("**Result 1**"));
    }

    #[tokio::test]
    async fn test_web_tools_without_key_report_the_variable() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/search").expect(0).create_async().await;

        let tools = web_registry(&server, None);
        let report = text(
            tools
                .execute("tavily_search", json!({"query": "test"}))
                .await
                .unwrap(),
        );
        assert!(report.contains("TAVILY_API_KEY"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_web_arguments_validated_before_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;
        let tools = web_registry(&server, Some("tvly-key"));

        let err = tools
            .execute("tavily_search", json!({"query": "q", "max_results": 50}))
            .await
            .unwrap_err();
        assert!(err.contains("max_results"));

        let err = tools
            .execute("tavily_extract", json!({"urls": "ftp://example.com"}))
            .await
            .unwrap_err();
        assert!(err.starts_with("Invalid arguments"));

        let err = tools
            .execute("tavily_crawl", json!({"url": "https://example.com", "max_depth": 9}))
            .await
            .unwrap_err();
        assert!(err.contains("max_depth"));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_web_crawl_and_map_tools() {
        let mut server = mockito::Server::new_async().await;
        let _crawl = server
            .mock("POST", "/crawl")
            .with_status(200)
            .with_body(
                r#"{"base_url": "docs.example", "results": [
                    {"url": "https://docs.example/a", "raw_content": "Page A"},
                    {"url": "https://docs.example/b", "raw_content": "Page B"}
                ]}"#,
            )
            .create_async()
            .await;
        let _map = server
            .mock("POST", "/map")
            .with_status(429)
            .create_async()
            .await;

        let tools = web_registry(&server, Some("tvly-key"));
        let crawled = text(
            tools
                .execute("tavily_crawl", json!({"url": "https://docs.example"}))
                .await
                .unwrap(),
        );
        assert!(crawled.contains("2 pages crawled"));
        assert!(crawled.contains("Page B"));

        let mapped = text(
            tools
                .execute("tavily_map", json!({"url": "https://docs.example"}))
                .await
                .unwrap(),
        );
        assert!(mapped.contains("Tavily map failed: Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_validation_happens_before_network() {
        let mock = MockSource::new(SourceType::OpenAlex);
        let tools = registry_with(vec![mock.clone()]);

        let err = tools
            .execute(
                "search_papers_openalex",
                json!({"query": "x", "max_results": 500}),
            )
            .await
            .unwrap_err();
        assert!(err.contains("max_results"));
        assert_eq!(mock.calls(), 0);

        let err = tools
            .execute("search_papers_aggregated", json!({"query": "x", "sources": []}))
            .await
            .unwrap_err();
        assert!(err.contains("sources"));

        let err = tools
            .execute("search_papers_openalex", json!({"max_results": 5}))
            .await
            .unwrap_err();
        assert!(err.starts_with("Invalid arguments"));
    }

    #[tokio::test]
    async fn test_single_source_reports() {
        let paper = Paper::new("W1", "Found It", SourceType::OpenAlex);
        let tools = registry_with(vec![
            MockSource::new(SourceType::OpenAlex).with_papers(vec![paper]),
            MockSource::new(SourceType::Arxiv).with_error(SourceError::Timeout("30s".into())),
        ]);

        let found = text(
            tools
                .execute("search_papers_openalex", json!({"query": "q"}))
                .await
                .unwrap(),
        );
        assert!(found.contains("Found It"));

        let failed = text(
            tools
                .execute("search_papers_arxiv", json!({"query": "q"}))
                .await
                .unwrap(),
        );
        assert!(failed.starts_with("⏱️ arXiv"));
    }

    #[tokio::test]
    async fn test_citation_tool_without_source() {
        let tools = registry_with(vec![MockSource::new(SourceType::OpenAlex)]);
        let err = tools
            .execute(
                "analyze_citation_network",
                json!({"paper_identifier": "1706.03762"}),
            )
            .await
            .unwrap_err();
        assert!(err.contains("citation-capable"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let tools = registry_with(Vec::new());
        assert!(tools.execute("download_paper", json!({})).await.is_err());
    }
}
