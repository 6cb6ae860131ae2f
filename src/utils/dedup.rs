//! Deduplication utilities for papers across sources.
//!
//! A record is a duplicate of an earlier *kept* record when they share a DOI,
//! share an arXiv ID, or (failing both) their normalized titles are more than
//! [`TITLE_SIMILARITY_THRESHOLD`] similar. The first occurrence always wins
//! and survivors keep their relative order.

use std::collections::HashSet;

use crate::models::Paper;

/// Fuzzy title match threshold (exclusive)
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.90;

/// Normalize a title for comparison
///
/// Lowercases, drops everything that is not a letter, digit or whitespace,
/// and collapses whitespace runs. Accepts `&str` or `Option<&str>`.
pub fn normalize_title<'a>(title: impl Into<Option<&'a str>>) -> String {
    let Some(title) = title.into() else {
        return String::new();
    };

    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity of two titles in `[0, 1]`, computed on their normalized forms
///
/// Returns 0.0 when either normalized title is empty.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_title(a);
    let b = normalize_title(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    sequence_ratio(&a, &b)
}

/// Ratcliff/Obershelp ratio: `2 * matches / (len(a) + len(b))`
fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Total size of the matching blocks found by recursive longest-match splitting
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`
///
/// Ties resolve to the earliest block in `a`, then the earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run[j] = length of the common run ending at a[i - 1], b[j]
    let mut prev = vec![0usize; bhi.saturating_sub(blo) + 1];
    let mut curr = vec![0usize; prev.len()];

    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            curr[slot] = if a[i] == b[j] { prev[slot - 1] + 1 } else { 0 };
            let k = curr[slot];
            if k > best_size {
                best_i = i + 1 - k;
                best_j = j + 1 - k;
                best_size = k;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_size)
}

fn doi_key(doi: &str) -> Option<String> {
    let lowered = doi.trim().to_lowercase();
    let bare = lowered
        .strip_prefix("https://doi.org/")
        .or_else(|| lowered.strip_prefix("http://doi.org/"))
        .unwrap_or(&lowered);
    (!bare.is_empty()).then(|| bare.to_string())
}

fn arxiv_key(id: &str) -> Option<String> {
    let lowered = id.trim().to_lowercase();
    let bare = lowered.strip_prefix("arxiv:").unwrap_or(&lowered);
    let bare = match bare.rsplit_once('v') {
        Some((id, version))
            if !id.is_empty()
                && !version.is_empty()
                && version.chars().all(|c| c.is_ascii_digit()) =>
        {
            id
        }
        _ => bare,
    };
    (!bare.is_empty()).then(|| bare.to_string())
}

/// Flag each record as duplicate (`true`) or kept (`false`)
///
/// Single pass in input order; only kept records populate the seen sets.
pub fn duplicate_flags(papers: &[Paper]) -> Vec<bool> {
    let mut seen_dois: HashSet<String> = HashSet::new();
    let mut seen_arxiv: HashSet<String> = HashSet::new();
    let mut seen_titles: Vec<String> = Vec::new();

    papers
        .iter()
        .map(|paper| {
            let doi = paper.doi.as_deref().and_then(doi_key);
            let arxiv = paper.arxiv_id.as_deref().and_then(arxiv_key);
            let title = normalize_title(paper.title.as_str());

            let by_id = doi.as_ref().is_some_and(|d| seen_dois.contains(d))
                || arxiv.as_ref().is_some_and(|a| seen_arxiv.contains(a));

            let duplicate = by_id
                || (!title.is_empty()
                    && seen_titles
                        .iter()
                        .any(|seen| sequence_ratio(&title, seen) > TITLE_SIMILARITY_THRESHOLD));

            if !duplicate {
                seen_dois.extend(doi);
                seen_arxiv.extend(arxiv);
                if !title.is_empty() {
                    seen_titles.push(title);
                }
            }

            duplicate
        })
        .collect()
}

/// Remove duplicate papers, keeping the first occurrence in its original position
pub fn deduplicate_papers(papers: Vec<Paper>) -> Vec<Paper> {
    let flags = duplicate_flags(&papers);
    papers
        .into_iter()
        .zip(flags)
        .filter(|(_, duplicate)| !duplicate)
        .map(|(paper, _)| paper)
        .collect()
}
