//! Fan-out/fan-in search across several backends.
//!
//! One tokio task per requested source, each bounded by its own timeout. The
//! barrier waits for every task up to `timeout + grace`; anything a task does
//! wrong (error, panic, overrun) becomes a failure record for that source only.

mod report;

pub use report::{AggregateReport, CombinedResults, SourceSection};

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::models::{AggregatedSearchRequest, Paper, SearchQuery, SearchResponse, SourceType};
use crate::sources::{Source, SourceError, SourceRegistry};
use crate::utils::duplicate_flags;

/// Default slack added to the per-source timeout for the outer barrier
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Tagged result of one adapter call
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// At least one paper
    Found(SearchResponse),
    /// The backend answered with zero matches
    Empty(SearchResponse),
    /// Transport, protocol or task failure
    Failed(SourceError),
}

impl SearchOutcome {
    pub fn from_result(result: Result<SearchResponse, SourceError>) -> Self {
        match result {
            Ok(response) if response.is_empty() => SearchOutcome::Empty(response),
            Ok(response) => SearchOutcome::Found(response),
            Err(err) => SearchOutcome::Failed(err),
        }
    }

    /// Whether a raw report was obtained at all
    pub fn succeeded(&self) -> bool {
        !matches!(self, SearchOutcome::Failed(_))
    }

    pub fn papers(&self) -> &[Paper] {
        match self {
            SearchOutcome::Found(response) | SearchOutcome::Empty(response) => &response.papers,
            SearchOutcome::Failed(_) => &[],
        }
    }

    /// Markdown for a single-source call
    pub fn render(&self, source: SourceType, query: &SearchQuery) -> String {
        match self {
            SearchOutcome::Found(response) => {
                crate::report::SourceReport::from_response(response, query).to_markdown()
            }
            SearchOutcome::Empty(_) => crate::report::no_results(source, query),
            SearchOutcome::Failed(err) => crate::report::error_report(source, err),
        }
    }
}

impl From<Result<SearchResponse, SourceError>> for SearchOutcome {
    fn from(result: Result<SearchResponse, SourceError>) -> Self {
        SearchOutcome::from_result(result)
    }
}

/// Runs one query against several backends concurrently
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    grace_period: Duration,
}

impl Aggregator {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self {
            registry,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Use the configured grace period
    pub fn from_config(registry: Arc<SourceRegistry>, config: &Config) -> Self {
        Self::new(registry)
            .with_grace_period(Duration::from_secs(config.aggregation.grace_period_secs))
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Query every requested source and merge the results
    ///
    /// Never fails: per-source problems are reported inside the returned
    /// [`AggregateReport`]. The request is expected to be validated already.
    pub async fn aggregate(&self, request: &AggregatedSearchRequest) -> AggregateReport {
        let started = Instant::now();
        let query = request.search_query();
        let sources = request.unique_sources();

        tracing::info!(
            query = %query.query,
            sources = sources.len(),
            per_source = query.max_results,
            "aggregated search started"
        );

        let outcomes = self.fan_out(&sources, &query, request.timeout()).await;

        for (source, outcome) in &outcomes {
            match outcome {
                SearchOutcome::Failed(err) => {
                    tracing::warn!(source = %source, kind = err.kind(), error = %err, "source failed")
                }
                other => tracing::debug!(source = %source, papers = other.papers().len(), "source answered"),
            }
        }

        let report = self.assemble(query, sources, outcomes, request.deduplicate, started);

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            all_failed = report.is_all_failed(),
            "aggregated search finished"
        );
        report
    }

    /// Spawn one task per source and wait on the barrier
    async fn fan_out(
        &self,
        sources: &[SourceType],
        query: &SearchQuery,
        timeout: Duration,
    ) -> Vec<(SourceType, SearchOutcome)> {
        let deadline = tokio::time::Instant::now() + timeout + self.grace_period;

        let tasks = sources.iter().map(|&source_type| {
            let source = self.registry.get(source_type).cloned();
            let query = query.clone();

            async move {
                let Some(source) = source else {
                    return (
                        source_type,
                        SearchOutcome::Failed(SourceError::InvalidRequest(format!(
                            "{} is not configured",
                            source_type
                        ))),
                    );
                };

                let handle = tokio::spawn(search_with_timeout(source, query, timeout));
                let abort = handle.abort_handle();

                let outcome = match tokio::time::timeout_at(deadline, handle).await {
                    Ok(Ok(result)) => SearchOutcome::from_result(result),
                    Ok(Err(join_err)) => SearchOutcome::Failed(SourceError::Internal(format!(
                        "search task {}",
                        if join_err.is_panic() { "panicked" } else { "was cancelled" }
                    ))),
                    Err(_) => {
                        abort.abort();
                        SearchOutcome::Failed(timeout_error(timeout))
                    }
                };
                (source_type, outcome)
            }
        });

        join_all(tasks).await
    }

    fn assemble(
        &self,
        query: SearchQuery,
        attempted: Vec<SourceType>,
        outcomes: Vec<(SourceType, SearchOutcome)>,
        deduplicate: bool,
        started: Instant,
    ) -> AggregateReport {
        let mut failures = Vec::new();
        let mut succeeded = Vec::new();
        for (source, outcome) in outcomes {
            match outcome {
                SearchOutcome::Failed(err) => failures.push((source, err)),
                SearchOutcome::Found(response) | SearchOutcome::Empty(response) => {
                    succeeded.push((source, response))
                }
            }
        }

        if succeeded.is_empty() {
            return AggregateReport::AllFailed {
                query: query.query,
                failures,
            };
        }

        let dedup_ran = deduplicate && succeeded.len() > 1;
        let flags = if dedup_ran {
            let union: Vec<Paper> = succeeded
                .iter()
                .flat_map(|(_, response)| response.papers.iter().cloned())
                .collect();
            duplicate_flags(&union)
        } else {
            Vec::new()
        };

        let mut offset = 0;
        let sections = succeeded
            .into_iter()
            .map(|(source, response)| {
                let fetched = response.papers.len();
                let mut kept = Vec::with_capacity(fetched);
                for (i, paper) in response.papers.into_iter().enumerate() {
                    if !flags.get(offset + i).copied().unwrap_or(false) {
                        kept.push(paper);
                    }
                }
                offset += fetched;

                SourceSection {
                    source,
                    fetched,
                    omitted: fetched - kept.len(),
                    total_results: response.total_results,
                    papers: kept,
                }
            })
            .collect();

        AggregateReport::Combined(CombinedResults {
            query,
            attempted,
            sections,
            failures,
            deduplicated: dedup_ran,
            elapsed: started.elapsed(),
        })
    }
}

async fn search_with_timeout(
    source: Arc<dyn Source>,
    query: SearchQuery,
    timeout: Duration,
) -> Result<SearchResponse, SourceError> {
    match tokio::time::timeout(timeout, source.search(&query)).await {
        Ok(result) => result,
        Err(_) => Err(timeout_error(timeout)),
    }
}

fn timeout_error(timeout: Duration) -> SourceError {
    SourceError::Timeout(format!("no response within {}s", timeout.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_paper;
    use crate::sources::MockSource;

    fn registry(sources: Vec<MockSource>) -> Arc<SourceRegistry> {
        let mut registry = SourceRegistry::new();
        for source in sources {
            registry.register(Arc::new(source));
        }
        Arc::new(registry)
    }

    #[test]
    fn test_outcome_tagging() {
        let empty = SearchResponse::new(Vec::new(), SourceType::Arxiv, "q");
        assert!(matches!(
            SearchOutcome::from_result(Ok(empty)),
            SearchOutcome::Empty(_)
        ));
        let failed = SearchOutcome::from_result(Err(SourceError::Network("down".into())));
        assert!(!failed.succeeded());
        assert!(failed.papers().is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_source_is_a_failure() {
        let aggregator = Aggregator::new(registry(vec![MockSource::new(SourceType::OpenAlex)
            .with_papers(vec![make_paper("W1", "Only", SourceType::OpenAlex)])]));

        let report = aggregator
            .aggregate(&AggregatedSearchRequest::new("q").sources([
                SourceType::OpenAlex,
                SourceType::Arxiv,
            ]))
            .await;

        let combined = report.combined().unwrap();
        assert_eq!(combined.sections.len(), 1);
        assert_eq!(combined.failures.len(), 1);
        assert_eq!(combined.failures[0].0, SourceType::Arxiv);
    }

    #[tokio::test]
    async fn test_duplicate_sources_queried_once() {
        let mock = MockSource::new(SourceType::OpenAlex);
        let aggregator = Aggregator::new(registry(vec![mock.clone()]));

        aggregator
            .aggregate(&AggregatedSearchRequest::new("q").sources([
                SourceType::OpenAlex,
                SourceType::OpenAlex,
            ]))
            .await;
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_panicking_source_becomes_failure() {
        let aggregator = Aggregator::new(registry(vec![
            MockSource::new(SourceType::OpenAlex).panicking(),
            MockSource::new(SourceType::Arxiv)
                .with_papers(vec![make_paper("1", "Survivor", SourceType::Arxiv)]),
        ]));

        let report = aggregator
            .aggregate(&AggregatedSearchRequest::new("q").sources([
                SourceType::OpenAlex,
                SourceType::Arxiv,
            ]))
            .await;

        let combined = report.combined().unwrap();
        assert!(matches!(
            combined.failures[0].1,
            SourceError::Internal(_)
        ));
        assert_eq!(combined.papers().len(), 1);
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let aggregator = Aggregator::new(registry(vec![
            MockSource::new(SourceType::OpenAlex).with_delay(Duration::from_secs(30)),
            MockSource::new(SourceType::Arxiv)
                .with_papers(vec![make_paper("1", "Fast", SourceType::Arxiv)]),
        ]));

        let report = aggregator
            .aggregate(
                &AggregatedSearchRequest::new("q")
                    .sources([SourceType::OpenAlex, SourceType::Arxiv])
                    .timeout_per_source(1),
            )
            .await;

        let combined = report.combined().unwrap();
        assert_eq!(combined.failures.len(), 1);
        assert!(matches!(combined.failures[0].1, SourceError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_dedup_skipped_for_single_success() {
        let papers = vec![
            make_paper("1", "Same Title", SourceType::OpenAlex),
            make_paper("2", "Same Title", SourceType::OpenAlex),
        ];
        let aggregator = Aggregator::new(registry(vec![
            MockSource::new(SourceType::OpenAlex).with_papers(papers)
        ]));

        let report = aggregator
            .aggregate(&AggregatedSearchRequest::new("q").sources([SourceType::OpenAlex]))
            .await;

        let combined = report.combined().unwrap();
        assert!(!combined.deduplicated);
        assert_eq!(combined.papers().len(), 2);
    }
}
