//! Composite markdown for an aggregated search.

use std::fmt::Write as _;
use std::time::Duration;

use crate::models::{Paper, SearchQuery, SourceType};
use crate::report::{no_results, paper_list};
use crate::sources::SourceError;

/// Marker heading of the total-failure report
pub const ALL_FAILED_HEADING: &str = "# ❌ All sources failed";

/// Outcome of an aggregated search
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateReport {
    /// No requested source produced a report
    AllFailed {
        query: String,
        failures: Vec<(SourceType, SourceError)>,
    },
    /// At least one source succeeded
    Combined(CombinedResults),
}

/// Results from the sources that answered
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedResults {
    pub query: SearchQuery,
    /// Sources queried, in request order
    pub attempted: Vec<SourceType>,
    /// One section per successful source, in request order
    pub sections: Vec<SourceSection>,
    pub failures: Vec<(SourceType, SourceError)>,
    /// Whether cross-source deduplication ran
    pub deduplicated: bool,
    pub elapsed: Duration,
}

/// Papers kept from one source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSection {
    pub source: SourceType,
    /// Papers returned before deduplication
    pub fetched: usize,
    /// Papers dropped because an earlier section already listed them
    pub omitted: usize,
    pub total_results: Option<u64>,
    pub papers: Vec<Paper>,
}

impl AggregateReport {
    pub fn is_all_failed(&self) -> bool {
        matches!(self, AggregateReport::AllFailed { .. })
    }

    pub fn combined(&self) -> Option<&CombinedResults> {
        match self {
            AggregateReport::Combined(results) => Some(results),
            AggregateReport::AllFailed { .. } => None,
        }
    }

    pub fn failures(&self) -> &[(SourceType, SourceError)] {
        match self {
            AggregateReport::AllFailed { failures, .. } => failures,
            AggregateReport::Combined(results) => &results.failures,
        }
    }

    pub fn to_markdown(&self) -> String {
        match self {
            AggregateReport::AllFailed { query, failures } => all_failed(query, failures),
            AggregateReport::Combined(results) => results.to_markdown(),
        }
    }
}

impl std::fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

impl CombinedResults {
    /// Every kept paper, in section order
    pub fn papers(&self) -> Vec<&Paper> {
        self.sections.iter().flat_map(|s| s.papers.iter()).collect()
    }

    /// Papers returned across all sections before deduplication
    pub fn fetched_total(&self) -> usize {
        self.sections.iter().map(|s| s.fetched).sum()
    }

    pub fn kept_total(&self) -> usize {
        self.sections.iter().map(|s| s.papers.len()).sum()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# 🔎 Multi-source search results\n\n");
        let _ = writeln!(out, "**Query:** {}", self.query.query);
        let filters = self.query.filter_description();
        if !filters.is_empty() {
            let _ = writeln!(out, "**Filters:** {}", filters);
        }
        let _ = writeln!(
            out,
            "**Sources:** {} attempted, {} succeeded, {} failed",
            self.attempted.len(),
            self.sections.len(),
            self.failures.len()
        );

        if !self.failures.is_empty() {
            out.push_str("\n## ⚠️ Failed sources\n\n");
            for (source, err) in &self.failures {
                let _ = writeln!(out, "- **{}**: {}", source, err);
            }
        }

        for section in &self.sections {
            let _ = write!(out, "\n## {} {}\n\n", section.source.icon(), section.source);
            if section.papers.is_empty() && section.omitted == 0 {
                out.push_str(&no_results(section.source, &self.query));
                out.push('\n');
                continue;
            }
            if let Some(total) = section.total_results {
                let _ = writeln!(out, "_{} matching papers in the database._\n", total);
            }
            if !section.papers.is_empty() {
                out.push_str(&paper_list(&section.papers, 3));
            }
            if section.omitted > 0 {
                let _ = writeln!(
                    out,
                    "\n_{} duplicate(s) already listed above omitted._",
                    section.omitted
                );
            }
        }

        out.push_str("\n---\n\n## 📊 Summary\n\n");
        for section in &self.sections {
            let _ = writeln!(out, "- {}: {} papers", section.source, section.fetched);
        }
        let _ = writeln!(out, "- **Total:** {} papers", self.fetched_total());
        if self.deduplicated {
            let _ = writeln!(
                out,
                "- **After deduplication:** {} unique papers",
                self.kept_total()
            );
        }
        let _ = writeln!(out, "- **Elapsed:** {:.1}s", self.elapsed.as_secs_f64());

        out
    }
}

fn all_failed(query: &str, failures: &[(SourceType, SourceError)]) -> String {
    let mut out = format!("{}\n\n**Query:** {}\n\n", ALL_FAILED_HEADING, query);
    for (source, err) in failures {
        let _ = writeln!(out, "- **{}** ({}): {}", source, err.kind(), err);
    }
    out.push_str("\n💡 Suggestion: check your network connection, wait a minute and try again.\n");
    out
}
