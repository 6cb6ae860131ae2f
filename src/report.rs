//! Markdown rendering for single-source search results.
//!
//! Every adapter result becomes a [`SourceReport`]: a one-line banner plus a
//! body of numbered paper blocks. The aggregator reuses the body and drops the
//! banner, so the two halves are kept apart.

use std::fmt::Write as _;

use crate::models::{Paper, SearchQuery, SearchResponse, SourceType};
use crate::sources::SourceError;

/// Authors shown before "et al."
const AUTHOR_LIMIT: usize = 3;

/// Abstract characters shown per paper
const ABSTRACT_PREVIEW: usize = 300;

/// A rendered per-source report
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    /// Top-level header naming the source and result count
    pub banner: String,
    /// Numbered paper blocks
    pub body: String,
}

impl SourceReport {
    /// Render a successful response; zero papers yields the no-results report
    pub fn from_response(response: &SearchResponse, query: &SearchQuery) -> Self {
        if response.is_empty() {
            return Self {
                banner: format!("# 📭 No results from {}", response.source),
                body: no_results(response.source, query),
            };
        }

        let mut banner = format!(
            "# 📚 Found {} papers from {}",
            response.papers.len(),
            response.source
        );
        let filters = query.filter_description();
        if !filters.is_empty() {
            let _ = write!(banner, "\n\n**Filters:** {}", filters);
        }
        if let Some(total) = response.total_results {
            let _ = write!(banner, "\n\n**Database total:** {} matching papers", total);
        }

        Self {
            banner,
            body: paper_list(&response.papers, 2),
        }
    }

    /// Banner and body joined
    pub fn to_markdown(&self) -> String {
        format!("{}\n\n{}", self.banner, self.body)
    }
}

impl std::fmt::Display for SourceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

/// Numbered paper blocks at the given heading level
pub fn paper_list<'a, I>(papers: I, heading_level: usize) -> String
where
    I: IntoIterator<Item = &'a Paper>,
{
    papers
        .into_iter()
        .enumerate()
        .map(|(i, paper)| paper_block(i + 1, paper, heading_level))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One paper as a markdown block
pub fn paper_block(index: usize, paper: &Paper, heading_level: usize) -> String {
    let hashes = "#".repeat(heading_level.max(1));
    let mut out = format!("{} {}. {}\n\n", hashes, index, paper.title);

    let _ = writeln!(out, "- **Authors:** {}", paper.author_summary(AUTHOR_LIMIT));
    if let Some(venue) = &paper.venue {
        let _ = writeln!(out, "- **Venue:** {}", venue);
    }
    match (paper.year, &paper.published_date) {
        (Some(year), Some(date)) => {
            let _ = writeln!(out, "- **Published:** {} ({})", year, date);
        }
        (Some(year), None) => {
            let _ = writeln!(out, "- **Published:** {}", year);
        }
        (None, Some(date)) => {
            let _ = writeln!(out, "- **Published:** {}", date);
        }
        (None, None) => {}
    }
    if let Some(work_type) = &paper.work_type {
        let _ = writeln!(out, "- **Type:** {}", work_type);
    }
    if paper.influential_citation_count > 0 {
        let _ = writeln!(
            out,
            "- **Citations:** {} ({} influential)",
            paper.citation_count, paper.influential_citation_count
        );
    } else {
        let _ = writeln!(out, "- **Citations:** {}", paper.citation_count);
    }
    if !paper.topics.is_empty() {
        let _ = writeln!(out, "- **Topics:** {}", paper.topics.join(", "));
    }
    if let Some(doi_url) = paper.doi_url() {
        let _ = writeln!(out, "- **DOI:** {}", doi_url);
    }
    let _ = writeln!(out, "- **Access:** {}", access_label(paper));
    if let Some(url) = &paper.url {
        let _ = writeln!(out, "- **Link:** {}", url);
    }
    if let Some(abstract_text) = paper.r#abstract.as_deref().filter(|a| !a.trim().is_empty()) {
        let _ = writeln!(out, "\n> {}", truncate_chars(abstract_text, ABSTRACT_PREVIEW));
    }

    out
}

/// Open-access description for one paper
pub fn access_label(paper: &Paper) -> String {
    if !paper.is_open_access {
        return "🔒 Subscription required".to_string();
    }

    let label = match paper.oa_status.as_deref() {
        Some(status) if !status.is_empty() && status != "closed" => {
            format!("🔓 Open access ({})", status)
        }
        _ => "🔓 Open access".to_string(),
    };

    match &paper.open_access_url {
        Some(url) => format!("{}: {}", label, url),
        None => label,
    }
}

/// Explicit zero-match report
pub fn no_results(source: SourceType, query: &SearchQuery) -> String {
    let mut out = format!(
        "📭 No papers found for '{}' on {}.",
        query.query.trim(),
        source
    );
    let filters = query.filter_description();
    if !filters.is_empty() {
        let _ = write!(out, "\n\nActive filters: {}", filters);
    }
    out.push_str("\n\n💡 Suggestion: try more general keywords or relax the filters.");
    out
}

/// Icon matching an error kind
pub fn error_icon(err: &SourceError) -> &'static str {
    match err {
        SourceError::Timeout(_) => "⏱️",
        SourceError::RateLimit(_) => "🚫",
        SourceError::Network(_) => "🌐",
        SourceError::Server { .. } => "⚠️",
        _ => "❌",
    }
}

/// Error report: `<icon> <Source>: <message>` plus a suggestion
pub fn error_report(source: SourceType, err: &SourceError) -> String {
    format!(
        "{} {}: {}\n\n💡 Suggestion: {}",
        error_icon(err),
        source,
        err,
        err.hint()
    )
}

/// Cut `text` to at most `max` characters, appending an ellipsis when shortened
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}
