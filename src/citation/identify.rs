//! Resolve a free-form paper identifier to one paper record.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Paper;
use crate::sources::Source;

/// Prefix of Semantic Scholar corpus IDs
const CORPUS_ID_PREFIX: &str = "CorpusId:";

/// Length of a Semantic Scholar paper hash
const NATIVE_ID_LEN: usize = 40;

/// A single lookup attempt, in priority order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    NativeId(String),
    Arxiv(String),
    Doi(String),
    Title(String),
}

impl Lookup {
    pub fn label(&self) -> &'static str {
        match self {
            Lookup::NativeId(_) => "native id",
            Lookup::Arxiv(_) => "arXiv id",
            Lookup::Doi(_) => "DOI",
            Lookup::Title(_) => "title search",
        }
    }

    async fn run(&self, source: &dyn Source) -> Option<Paper> {
        let result = match self {
            Lookup::NativeId(id) => source.get_by_id(id).await,
            Lookup::Arxiv(id) => source.get_by_arxiv_id(id).await,
            Lookup::Doi(doi) => source.get_by_doi(doi).await,
            Lookup::Title(title) => source.search_by_title(title).await,
        };

        match result {
            Ok(paper) => Some(paper),
            Err(err) => {
                tracing::debug!(strategy = self.label(), error = %err, "lookup failed, trying next");
                None
            }
        }
    }
}

/// Four digits, dot, four or five digits, not embedded in a longer digit run
fn arxiv_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|\D)(\d{4}\.\d{4,5})(?:v\d+)?(?:\D|$)").expect("valid arXiv regex")
    })
}

fn doi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"10\.\d{4,}/\S+").expect("valid DOI regex"))
}

/// First arXiv-style identifier (`1706.03762`) embedded in `text`
pub fn extract_arxiv_id(text: &str) -> Option<String> {
    arxiv_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First DOI embedded in `text`
pub fn extract_doi(text: &str) -> Option<String> {
    doi_pattern().find(text).map(|m| m.as_str().to_string())
}

/// Whether `text` is shaped like a Semantic Scholar ID
pub fn looks_like_native_id(text: &str) -> bool {
    text.starts_with(CORPUS_ID_PREFIX) || text.chars().count() == NATIVE_ID_LEN
}

/// Lookups that apply to `identifier`, in the order they are tried
///
/// 1. native ID, 2. embedded arXiv ID, 3. DOI (only when "arxiv" is not
/// mentioned), 4. title search (skipped for strings starting with `10.` or `http`).
pub fn identification_plan(identifier: &str) -> Vec<Lookup> {
    let identifier = identifier.trim();
    let mut plan = Vec::new();

    if looks_like_native_id(identifier) {
        plan.push(Lookup::NativeId(identifier.to_string()));
    }

    if let Some(arxiv_id) = extract_arxiv_id(identifier) {
        plan.push(Lookup::Arxiv(arxiv_id));
    }

    if identifier.contains("10.") && !identifier.to_lowercase().contains("arxiv") {
        if let Some(doi) = extract_doi(identifier) {
            plan.push(Lookup::Doi(doi));
        }
    }

    if !(identifier.starts_with("10.") || identifier.starts_with("http")) {
        plan.push(Lookup::Title(identifier.to_string()));
    }

    plan
}

/// Resolve `identifier` against `source`, stopping at the first hit
///
/// Lookup errors are swallowed; `None` means no strategy produced a paper.
pub async fn identify_paper(source: &dyn Source, identifier: &str) -> Option<Paper> {
    for lookup in identification_plan(identifier) {
        if let Some(paper) = lookup.run(source).await {
            tracing::info!(strategy = lookup.label(), title = %paper.title, "paper identified");
            return Some(paper);
        }
    }

    tracing::warn!(identifier, "paper not found");
    None
}
