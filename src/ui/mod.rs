//! Terminal rendering for the command-line interface.
//!
//! Colours are applied only when stdout is a terminal.

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, CellAlignment, ContentArrangement, Table};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::aggregator::AggregateReport;
use crate::citation::CitationNetwork;
use crate::models::Paper;
use crate::sources::Source;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// A status line, coloured when writing to a terminal
pub fn status_line(status: Status, message: &str) -> String {
    let icon = status_icon(status);
    if !is_terminal() {
        return format!("{} {}", icon, message);
    }
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), message),
        Status::Error => format!("{} {}", icon.red().bold(), message),
        Status::Warning => format!("{} {}", icon.yellow().bold(), message),
        Status::Info => format!("{} {}", icon.cyan().bold(), message),
    }
}

/// Print a section header.
pub fn section(title: &str) -> String {
    let line = format!("━━━ {} ━━━", title);
    if is_terminal() {
        line.bold().cyan().to_string()
    } else {
        line
    }
}

fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut.trim_end())
    } else {
        text.to_string()
    }
}

fn base_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h).add_attribute(Attribute::Bold)));
    table
}

/// Papers as a table: title, authors, year, citations, source
pub fn papers_table<'a>(papers: impl IntoIterator<Item = &'a Paper>) -> Table {
    let mut table = base_table(&["#", "Title", "Authors", "Year", "Cites", "Source"]);

    for (i, paper) in papers.into_iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(shorten(&paper.title, 60)).add_attribute(Attribute::Bold),
            Cell::new(shorten(&paper.author_summary(2), 30)),
            Cell::new(paper.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(paper.citation_count).set_alignment(CellAlignment::Right),
            Cell::new(paper.source().name()),
        ]);
    }
    table
}

/// Ranked papers with their importance score
pub fn ranked_table(papers: &[Paper]) -> Table {
    let mut table = base_table(&["#", "Score", "Title", "Year", "Cites", "Venue", "OA"]);

    for (i, paper) in papers.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{:.1}", paper.importance_score.unwrap_or(0.0)))
                .set_alignment(CellAlignment::Right),
            Cell::new(shorten(&paper.title, 60)).add_attribute(Attribute::Bold),
            Cell::new(paper.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(paper.citation_count).set_alignment(CellAlignment::Right),
            Cell::new(shorten(paper.venue.as_deref().unwrap_or(""), 25)),
            Cell::new(if paper.is_open_access { "🔓" } else { "" }),
        ]);
    }
    table
}

/// Registered sources and what they can do
pub fn sources_table<'a>(sources: impl IntoIterator<Item = &'a std::sync::Arc<dyn Source>>) -> Table {
    let mut table = base_table(&["ID", "Name", "Search", "Citations", "DOI lookup"]);
    let mark = |yes: bool| if yes { "✓" } else { "" };

    for source in sources {
        table.add_row(vec![
            Cell::new(format!("{} {}", source.source_type().icon(), source.id())),
            Cell::new(source.name()),
            Cell::new(mark(source.supports_search())),
            Cell::new(mark(source.supports_citations())),
            Cell::new(mark(source.supports_doi_lookup())),
        ]);
    }
    table
}

/// Table view of an aggregated search
pub fn aggregate_summary(report: &AggregateReport) -> String {
    let mut out = Vec::new();

    for (source, err) in report.failures() {
        out.push(status_line(
            Status::Warning,
            &format!("{} failed: {}", source, err),
        ));
    }

    match report.combined() {
        None => out.push(status_line(Status::Error, "All sources failed")),
        Some(results) => {
            let summary = if results.deduplicated {
                format!(
                    "{} papers from {} sources, {} after deduplication",
                    results.fetched_total(),
                    results.sections.len(),
                    results.kept_total()
                )
            } else {
                format!(
                    "{} papers from {} sources",
                    results.fetched_total(),
                    results.sections.len()
                )
            };
            out.push(status_line(Status::Success, &summary));
            out.push(papers_table(results.papers()).to_string());
        }
    }

    out.join("\n")
}

/// Table view of a citation network
pub fn network_summary(network: &CitationNetwork) -> String {
    match network {
        CitationNetwork::NotFound { identifier } => {
            status_line(Status::Error, &format!("Paper not found: {}", identifier))
        }
        CitationNetwork::NoCitationData { paper } => status_line(
            Status::Warning,
            &format!("Paper found but no citation data: {}", paper.title),
        ),
        CitationNetwork::Ranked {
            paper,
            references,
            citations,
        } => [
            status_line(
                Status::Success,
                &format!("{} ({} citations)", paper.title, paper.citation_count),
            ),
            section("Foundations"),
            ranked_table(references).to_string(),
            section("Follow-ups"),
            ranked_table(citations).to_string(),
        ]
        .join("\n"),
    }
}
