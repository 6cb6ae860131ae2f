//! Markdown and Mermaid rendering of a citation network.

use std::fmt::Write as _;

use super::CitationNetwork;
use crate::models::Paper;

/// Nodes drawn per side of the diagram
const GRAPH_NODES: usize = 5;

const SUPPORTED_FORMATS: &str = "Supported identifier formats:\n\
- Paper title\n\
- arXiv ID (e.g. 1706.03762)\n\
- DOI\n\
- Semantic Scholar ID or URL";

pub fn render_network(network: &CitationNetwork) -> String {
    match network {
        CitationNetwork::NotFound { identifier } => format!(
            "❌ Paper not found: {}\n\nCheck the identifier. {}",
            identifier, SUPPORTED_FORMATS
        ),
        CitationNetwork::NoCitationData { paper } => format!(
            "⚠️ Paper found but no citation data: {}\n\n\
             It may be very recent, or the database has no citation records for it yet.",
            paper.title
        ),
        CitationNetwork::Ranked {
            paper,
            references,
            citations,
        } => ranked(paper, references, citations),
    }
}

fn ranked(paper: &Paper, references: &[Paper], citations: &[Paper]) -> String {
    let mut out = String::from("# 📊 Citation network analysis\n\n## 🎯 Target paper\n\n");
    let _ = writeln!(out, "**{}**\n", paper.title);

    if !paper.authors.is_empty() {
        let _ = writeln!(out, "- **Authors:** {}", paper.author_summary(5));
    }
    let _ = writeln!(out, "- **Year:** {}", year_or_na(paper));
    let _ = writeln!(out, "- **Citations:** {}", paper.citation_count);
    let _ = writeln!(
        out,
        "- **Influential citations:** {}",
        paper.influential_citation_count
    );
    let _ = writeln!(out, "- **Venue:** {}", paper.venue.as_deref().unwrap_or("N/A"));
    let _ = writeln!(out, "- **Link:** {}", paper.url.as_deref().unwrap_or("N/A"));

    let _ = write!(
        out,
        "\n---\n\n## 📚 Foundations: key references (Top {})\n\n\
         The most important works this paper builds on.\n\n",
        references.len()
    );
    for (i, reference) in references.iter().enumerate() {
        out.push_str(&ranked_paper(i + 1, reference));
    }

    let _ = write!(
        out,
        "---\n\n## 🚀 Follow-ups: state-of-the-art citing papers (Top {})\n\n\
         Recent, well-cited work that builds on this paper.\n\n",
        citations.len()
    );
    for (i, citation) in citations.iter().enumerate() {
        out.push_str(&ranked_paper(i + 1, citation));
    }

    let open_access = references
        .iter()
        .chain(citations)
        .filter(|p| p.is_open_access)
        .count();
    let _ = write!(
        out,
        "---\n\n## 📈 Statistics\n\n\
         - **References:** {}\n\
         - **Citing papers:** {}\n\
         - **Mean citations (references):** {:.1}\n\
         - **Mean citations (citing papers):** {:.1}\n\
         - **Open-access papers:** {}\n\n\
         💡 Papers marked 🔓 have free full text.\n\n",
        references.len(),
        citations.len(),
        mean_citations(references),
        mean_citations(citations),
        open_access
    );

    if !references.is_empty() || !citations.is_empty() {
        out.push_str(&mermaid_graph(
            paper,
            &references[..references.len().min(GRAPH_NODES)],
            &citations[..citations.len().min(GRAPH_NODES)],
        ));
    }

    out
}

fn ranked_paper(index: usize, paper: &Paper) -> String {
    let oa_mark = if paper.is_open_access { " 🔓" } else { "" };
    let score = paper.importance_score.unwrap_or(0.0);

    format!(
        "### {}. {}{}\n\
         - **Authors:** {}\n\
         - **Year:** {}\n\
         - **Citations:** {}\n\
         - **Venue:** {}\n\
         - **Importance:** {:.1}/100\n\
         - **Link:** {}\n\n",
        index,
        paper.title,
        oa_mark,
        paper.author_summary(3),
        year_or_na(paper),
        paper.citation_count,
        paper.venue.as_deref().unwrap_or("N/A"),
        score,
        paper.url.as_deref().unwrap_or("N/A"),
    )
}

fn year_or_na(paper: &Paper) -> String {
    paper
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn mean_citations(papers: &[Paper]) -> f64 {
    if papers.is_empty() {
        return 0.0;
    }
    let total: u64 = papers.iter().map(|p| u64::from(p.citation_count)).sum();
    total as f64 / papers.len() as f64
}

/// Mermaid labels cannot contain quotes or brackets
fn node_label(title: &str, max: usize) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '"' | '[' | ']' | '(' | ')' | '{' | '}' | '<' | '>' | '|' | '/' | '\\' => ' ',
            other => other,
        })
        .collect();
    let cut: String = cleaned.trim().chars().take(max).collect();
    cut.trim_end().to_string()
}

/// `graph TB` diagram: references point at the target, the target points at citing papers
pub fn mermaid_graph(paper: &Paper, references: &[Paper], citations: &[Paper]) -> String {
    let mut out = String::from("---\n\n## 🔗 Citation graph\n\n```mermaid\ngraph TB\n");
    let _ = writeln!(
        out,
        "    Center[\"📄 {}...<br/>({})\"]\n",
        node_label(&paper.title, 40),
        year_or_na(paper)
    );

    out.push_str("    subgraph refs[\"📚 Foundations\"]\n");
    for (i, reference) in references.iter().enumerate() {
        let title = node_label(&reference.title, 30);
        let year = year_or_na(reference);
        let cites = reference.citation_count;
        let node = if cites > 10_000 {
            format!("Ref{}[/🌟 {}...<br/>({}, {} cites)/]", i, title, year, cites)
        } else if cites > 1_000 {
            format!("Ref{}[/{}...<br/>({}, {} cites)/]", i, title, year, cites)
        } else {
            format!("Ref{}[{}...<br/>({})]", i, title, year)
        };
        let _ = writeln!(out, "        {}", node);
        let _ = writeln!(out, "        Ref{} -->|cites| Center", i);
    }
    out.push_str("    end\n\n    subgraph cites[\"🚀 Follow-ups\"]\n");

    for (i, citation) in citations.iter().enumerate() {
        let title = node_label(&citation.title, 30);
        let year = year_or_na(citation);
        let cites = citation.citation_count;
        let node = match citation.year {
            Some(y) if y >= 2023 => {
                format!("Cite{}[\\🔥 {}...<br/>({}, {} cites)\\]", i, title, year, cites)
            }
            Some(y) if y >= 2020 => {
                format!("Cite{}[\\{}...<br/>({}, {} cites)\\]", i, title, year, cites)
            }
            _ => format!("Cite{}[{}...<br/>({})]", i, title, year),
        };
        let _ = writeln!(out, "        {}", node);
        let _ = writeln!(out, "        Center -->|cited by| Cite{}", i);
    }

    out.push_str(
        "    end\n\n\
         \x20   style Center fill:#f9f,stroke:#333,stroke-width:4px\n\
         \x20   style refs fill:#e1f5ff,stroke:#01579b,stroke-width:2px\n\
         \x20   style cites fill:#fff3e0,stroke:#e65100,stroke-width:2px\n\
         ```\n\n\
         **Legend:**\n\
         - 📄 target paper\n\
         - 📚 references the paper builds on\n\
         - 🚀 state-of-the-art papers citing it\n\
         - 🌟 highly cited (>10,000)\n\
         - 🔥 recent (2023+)\n",
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaperBuilder, SourceType};

    fn paper(title: &str, citations: u32, year: i32) -> Paper {
        let mut p = PaperBuilder::new(title, title, SourceType::SemanticScholar)
            .citations(citations)
            .year(year)
            .build();
        p.importance_score = Some(42.5);
        p
    }

    #[test]
    fn test_not_found_lists_formats() {
        let text = render_network(&CitationNetwork::NotFound {
            identifier: "xyz".into(),
        });
        assert!(text.starts_with("❌ Paper not found: xyz"));
        assert!(text.contains("arXiv ID"));
    }

    #[test]
    fn test_no_citation_data() {
        let text = render_network(&CitationNetwork::NoCitationData {
            paper: paper("Lonely", 0, 2024),
        });
        assert!(text.contains("found but no citation data: Lonely"));
    }

    #[test]
    fn test_ranked_report_sections() {
        let mut oa = paper("Open Ref", 20_000, 2012);
        oa.is_open_access = true;
        let network = CitationNetwork::Ranked {
            paper: paper("Target", 100, 2017),
            references: vec![oa, paper("Plain Ref", 50, 2010)],
            citations: vec![paper("Hot", 3, 2024), paper("Older", 900, 2019)],
        };
        let text = render_network(&network);

        assert!(text.contains("Foundations: key references (Top 2)"));
        assert!(text.contains("### 1. Open Ref 🔓"));
        assert!(text.contains("**Importance:** 42.5/100"));
        assert!(text.contains("**Mean citations (references):** 10025.0"));
        assert!(text.contains("**Open-access papers:** 1"));
        assert!(text.contains("```mermaid\ngraph TB"));
        assert!(text.contains("Ref0[/🌟 Open Ref...<br/>(2012, 20000 cites)/]"));
        assert!(text.contains("Ref1[Plain Ref...<br/>(2010)]"));
        assert!(text.contains("Cite0[\\🔥 Hot...<br/>(2024, 3 cites)\\]"));
        assert!(text.contains("Cite1[Older...<br/>(2019)]"));
        assert!(text.contains("Center -->|cited by| Cite1"));
    }

    #[test]
    fn test_integral_score_keeps_one_decimal() {
        let mut whole = paper("Whole", 10, 2015);
        whole.importance_score = Some(28.0);
        let text = ranked_paper(1, &whole);
        assert!(text.contains("**Importance:** 28.0/100"));
    }

    #[test]
    fn test_graph_limited_to_five_per_side() {
        let refs: Vec<Paper> = (0..8).map(|i| paper(&format!("R{}", i), 1, 2000)).collect();
        let network = CitationNetwork::Ranked {
            paper: paper("T", 1, 2020),
            references: refs,
            citations: Vec::new(),
        };
        let text = render_network(&network);
        assert!(text.contains("Ref4 -->|cites| Center"));
        assert!(!text.contains("Ref5 -->|cites| Center"));
    }

    #[test]
    fn test_node_label_strips_brackets() {
        assert_eq!(node_label("A [B] (C)", 30), "A  B   C");
        assert_eq!(node_label("abcdef", 3), "abc");
    }
}
