//! Integration tests for Research Scout
//!
//! Adapters run against local mockito servers; pipeline tests use
//! `MockSource` so no test touches the real APIs.

use mockito::Matcher;
use research_scout::config::Config;
use research_scout::mcp::ToolRegistry;
use research_scout::models::{
    AggregatedSearchRequest, CitationNetworkRequest, Paper, PaperBuilder, SearchQuery, SourceType,
};
use research_scout::sources::mock::make_paper;
use research_scout::sources::{
    MockSource, OpenAlexSource, SemanticScholarSource, Source, SourceError, SourceRegistry,
};
use research_scout::utils::deduplicate_papers;
use research_scout::{Aggregator, CitationAnalyzer, CitationNetwork};
use serde_json::json;
use std::sync::Arc;

fn registry(sources: Vec<Arc<dyn Source>>) -> Arc<SourceRegistry> {
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry.register(source);
    }
    Arc::new(registry)
}

fn titled(title: &str, source: SourceType) -> Paper {
    PaperBuilder::new(title, title, source).build()
}

fn titles(papers: &[&Paper]) -> Vec<String> {
    papers.iter().map(|p| p.title.clone()).collect()
}

#[test]
fn test_deduplicate_reference_scenario() {
    let papers = vec![
        PaperBuilder::new("1", "Paper A", SourceType::OpenAlex)
            .doi("10.1234/a")
            .build(),
        PaperBuilder::new("2", "Paper A", SourceType::SemanticScholar)
            .doi("10.1234/a")
            .build(),
        PaperBuilder::new("3", "Paper B", SourceType::Arxiv)
            .arxiv_id("2301.12345")
            .build(),
        PaperBuilder::new("4", "Paper B", SourceType::SemanticScholar)
            .arxiv_id("2301.12345")
            .build(),
        titled("Paper C", SourceType::OpenAlex),
        titled("Paper-C!", SourceType::Arxiv),
        titled("Paper D", SourceType::Arxiv),
    ];

    let kept = deduplicate_papers(papers);
    let kept_titles: Vec<&str> = kept.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(kept_titles, vec!["Paper A", "Paper B", "Paper C", "Paper D"]);

    let again = deduplicate_papers(kept.clone());
    assert_eq!(again, kept);
}

#[tokio::test]
async fn test_aggregate_deduplicates_across_sources() {
    let openalex = MockSource::new(SourceType::OpenAlex).with_papers(vec![
        PaperBuilder::new("W1", "Attention Is All You Need", SourceType::OpenAlex)
            .doi("10.48550/arXiv.1706.03762")
            .build(),
        titled("Graph Attention Networks", SourceType::OpenAlex),
    ]);
    let arxiv = MockSource::new(SourceType::Arxiv).with_papers(vec![
        titled("Attention is all you need.", SourceType::Arxiv),
        titled("Deep Residual Learning for Image Recognition", SourceType::Arxiv),
    ]);
    let semantic = MockSource::new(SourceType::SemanticScholar).with_papers(vec![
        PaperBuilder::new("S1", "A different title", SourceType::SemanticScholar)
            .doi("10.48550/ARXIV.1706.03762")
            .build(),
    ]);

    let aggregator = Aggregator::new(registry(vec![
        Arc::new(openalex),
        Arc::new(arxiv),
        Arc::new(semantic),
    ]));
    let report = aggregator
        .aggregate(&AggregatedSearchRequest::new("attention"))
        .await;

    let combined = report.combined().expect("at least one source succeeded");
    assert!(combined.deduplicated);
    assert_eq!(combined.fetched_total(), 5);
    assert_eq!(combined.kept_total(), 3);
    assert_eq!(
        titles(&combined.papers()),
        vec![
            "Attention Is All You Need",
            "Graph Attention Networks",
            "Deep Residual Learning for Image Recognition",
        ]
    );

    let text = report.to_markdown();
    assert!(text.contains("**Sources:** 3 attempted, 3 succeeded, 0 failed"));
    assert!(text.contains("**After deduplication:** 3 unique papers"));
    assert!(text.contains("duplicate(s) already listed above omitted"));
}

#[tokio::test]
async fn test_aggregate_keeps_duplicates_when_disabled() {
    let paper = |source| titled("Same Paper", source);
    let aggregator = Aggregator::new(registry(vec![
        Arc::new(MockSource::new(SourceType::OpenAlex).with_papers(vec![paper(SourceType::OpenAlex)])),
        Arc::new(MockSource::new(SourceType::Arxiv).with_papers(vec![paper(SourceType::Arxiv)])),
    ]));

    let request = AggregatedSearchRequest::new("same")
        .sources([SourceType::OpenAlex, SourceType::Arxiv])
        .deduplicate(false);
    let report = aggregator.aggregate(&request).await;

    let combined = report.combined().unwrap();
    assert!(!combined.deduplicated);
    assert_eq!(combined.kept_total(), 2);
    assert!(!report.to_markdown().contains("After deduplication"));
}

#[tokio::test]
async fn test_partial_failure_still_reports_successes() {
    let aggregator = Aggregator::new(registry(vec![
        Arc::new(
            MockSource::new(SourceType::OpenAlex)
                .with_papers(vec![titled("Survivor", SourceType::OpenAlex)]),
        ),
        Arc::new(
            MockSource::new(SourceType::Arxiv)
                .with_error(SourceError::Network("connection reset".into())),
        ),
        Arc::new(MockSource::new(SourceType::SemanticScholar).with_error(
            SourceError::RateLimit("Semantic Scholar rate limit reached".into()),
        )),
    ]));

    let report = aggregator
        .aggregate(&AggregatedSearchRequest::new("anything"))
        .await;

    assert!(!report.is_all_failed());
    assert_eq!(report.failures().len(), 2);
    let text = report.to_markdown();
    assert!(!text.contains("All sources failed"));
    assert!(text.contains("Survivor"));
    assert!(text.contains("**Sources:** 3 attempted, 1 succeeded, 2 failed"));
    assert!(text.contains("## ⚠️ Failed sources"));
}

#[tokio::test]
async fn test_total_failure_short_circuits() {
    let aggregator = Aggregator::new(registry(vec![
        Arc::new(
            MockSource::new(SourceType::OpenAlex).with_error(SourceError::Server { status: 503 }),
        ),
        Arc::new(
            MockSource::new(SourceType::Arxiv).with_error(SourceError::Timeout("30s".into())),
        ),
    ]));

    let request =
        AggregatedSearchRequest::new("doomed").sources([SourceType::OpenAlex, SourceType::Arxiv]);
    let report = aggregator.aggregate(&request).await;

    assert!(report.is_all_failed());
    assert!(report.combined().is_none());
    let text = report.to_markdown();
    assert!(text.contains("All sources failed"));
    assert!(text.contains("OpenAlex"));
    assert!(text.contains("arXiv"));
    assert!(!text.contains("Summary"));
}

#[tokio::test]
async fn test_aggregate_over_http_adapters() {
    let mut server = mockito::Server::new_async().await;
    let _works = server
        .mock("GET", "/works")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"meta": {"count": 1}, "results": [{
                "id": "https://openalex.org/W42",
                "title": "Neural Machine Translation",
                "doi": "https://doi.org/10.5555/nmt",
                "publication_year": 2015,
                "cited_by_count": 900
            }]}"#,
        )
        .create_async()
        .await;
    let _s2 = server
        .mock("GET", "/paper/search")
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let openalex = OpenAlexSource::new().unwrap().with_base_url(server.url());
    let semantic = SemanticScholarSource::new()
        .unwrap()
        .with_base_url(server.url());
    let aggregator = Aggregator::new(registry(vec![Arc::new(openalex), Arc::new(semantic)]));

    let request = AggregatedSearchRequest::new("translation")
        .sources([SourceType::OpenAlex, SourceType::SemanticScholar]);
    let report = aggregator.aggregate(&request).await;

    let combined = report.combined().unwrap();
    assert_eq!(combined.kept_total(), 1);
    assert_eq!(combined.papers()[0].doi.as_deref(), Some("10.5555/nmt"));
    assert!(matches!(
        report.failures(),
        [(SourceType::SemanticScholar, SourceError::RateLimit(_))]
    ));
}

#[tokio::test]
async fn test_citation_pipeline_ranks_network() {
    let target = PaperBuilder::new("abc123", "Target Paper", SourceType::SemanticScholar)
        .arxiv_id("1706.03762")
        .citations(5000)
        .build();
    let references = vec![
        PaperBuilder::new("r1", "Minor Reference", SourceType::SemanticScholar)
            .citations(3)
            .year(2021)
            .build(),
        PaperBuilder::new("r2", "Classic Reference", SourceType::SemanticScholar)
            .citations(20000)
            .influential_citations(400)
            .year(1997)
            .venue("Neural Computation")
            .build(),
    ];
    let citations = vec![
        PaperBuilder::new("c1", "Old Follow-up", SourceType::SemanticScholar)
            .citations(10)
            .year(2018)
            .build(),
        PaperBuilder::new("c2", "Fresh Follow-up", SourceType::SemanticScholar)
            .citations(80)
            .year(2024)
            .venue("NeurIPS")
            .open_access(true, Some("https://example.org/c2.pdf".into()))
            .build(),
    ];

    let source = MockSource::new(SourceType::SemanticScholar)
        .with_lookup(target)
        .with_network(references, citations);
    let analyzer = CitationAnalyzer::new(Arc::new(source)).with_reference_year(2024);

    let network = analyzer
        .analyze(&CitationNetworkRequest::new("arXiv:1706.03762"))
        .await;

    match &network {
        CitationNetwork::Ranked {
            paper,
            references,
            citations,
        } => {
            assert_eq!(paper.title, "Target Paper");
            assert_eq!(references[0].title, "Classic Reference");
            assert_eq!(citations[0].title, "Fresh Follow-up");
            assert!(references
                .iter()
                .chain(citations.iter())
                .all(|p| p.importance_score.is_some_and(|s| (0.0..=100.0).contains(&s))));
        }
        other => panic!("expected a ranked network, got {:?}", other),
    }

    let text = network.to_markdown();
    assert!(text.contains("Foundations: key references (Top 2)"));
    assert!(text.contains("```mermaid"));
}

#[tokio::test]
async fn test_citation_pipeline_unknown_paper() {
    let analyzer = CitationAnalyzer::new(Arc::new(MockSource::new(SourceType::SemanticScholar)));
    let network = analyzer
        .analyze(&CitationNetworkRequest::new("A paper nobody wrote"))
        .await;

    assert!(matches!(network, CitationNetwork::NotFound { .. }));
    assert!(network.to_markdown().starts_with("❌ Paper not found"));
}

#[tokio::test]
async fn test_tool_registry_end_to_end() {
    let sources = registry(vec![
        Arc::new(
            MockSource::new(SourceType::OpenAlex)
                .with_papers(vec![make_paper("W1", "Tool Paper", SourceType::OpenAlex)]),
        ),
        Arc::new(MockSource::new(SourceType::Arxiv)),
        Arc::new(MockSource::new(SourceType::SemanticScholar)),
    ]);
    let tools = ToolRegistry::from_sources(sources, &Config::default());
    assert_eq!(tools.len(), 9);

    let result = tools
        .execute(
            "search_papers_aggregated",
            json!({"query": "tools", "max_results_per_source": 3, "timeout_per_source": 10}),
        )
        .await
        .unwrap();
    let text = result.as_str().unwrap();
    assert!(text.contains("Tool Paper"));
    assert!(text.contains("3 attempted, 3 succeeded"));

    let err = tools
        .execute(
            "search_papers_aggregated",
            json!({"query": "tools", "timeout_per_source": 5}),
        )
        .await
        .unwrap_err();
    assert!(err.contains("timeout_per_source"));
}

#[tokio::test]
async fn test_single_source_query_passes_filters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/works")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search".into(), "crispr".into()),
            Matcher::UrlEncoded("filter".into(), "publication_year:>2020".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"meta": {"count": 0}, "results": []}"#)
        .create_async()
        .await;

    let source = OpenAlexSource::new().unwrap().with_base_url(server.url());
    let response = source
        .search(&SearchQuery::new("crispr").year(">2020"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(response.is_empty());
}

#[tokio::test]
async fn test_web_extract_tool_against_mock_api() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/extract")
        .match_header("authorization", "Bearer tvly-integration")
        .match_body(Matcher::PartialJson(json!({
            "urls": ["https://example.com"],
            "format": "text",
        })))
        .with_status(200)
        .with_body(
            r#"{"results": [{"url": "https://example.com", "raw_content": "Example body"}],
                "failed_results": []}"#,
        )
        .create_async()
        .await;

    let mut config = Config::default();
    config.endpoints.tavily = server.url();
    config.api_keys.tavily = Some("tvly-integration".to_string());
    let tools = ToolRegistry::from_sources(registry(Vec::new()), &config);

    let result = tools
        .execute(
            "tavily_extract",
            json!({"urls": "https://example.com", "format": "text"}),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    let text = result.as_str().unwrap();
    assert!(text.contains("Extracted 1 pages (0 failed)"));
    assert!(text.contains("Example body"));
}
