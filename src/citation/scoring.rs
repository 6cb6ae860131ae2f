//! Importance scores for references and citing papers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::Paper;

/// Year treated as "now" when scoring citing papers for recency
pub const CITATION_REFERENCE_YEAR: i32 = 2024;

/// Venue abbreviations that earn the top-venue bonus (substring match, case-insensitive)
pub const TOP_VENUES: [&str; 14] = [
    "cvpr", "iccv", "eccv", "iclr", "neurips", "icml", "acl", "emnlp", "naacl", "aaai", "ijcai",
    "kdd", "www", "sigir",
];

/// Which list a paper is being ranked in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    /// Papers the target cites: favours established, highly cited work
    Reference,
    /// Papers citing the target: favours recent work
    Citation,
}

impl FromStr for RankingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reference" | "references" => Ok(RankingMode::Reference),
            "citation" | "citations" => Ok(RankingMode::Citation),
            other => Err(format!(
                "unknown ranking mode '{}' (expected reference or citation)",
                other
            )),
        }
    }
}

pub fn is_top_venue(venue: Option<&str>) -> bool {
    venue.is_some_and(|v| {
        let v = v.to_lowercase();
        TOP_VENUES.iter().any(|top| v.contains(top))
    })
}

/// Linear contribution saturating at `cap`
fn saturating(count: u32, cap: f64, weight: f64) -> f64 {
    (f64::from(count) / cap).min(1.0) * weight
}

fn round1(score: f64) -> f64 {
    ((score * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

/// Foundational-importance score of a referenced paper, in [0, 100]
pub fn calculate_reference_score(paper: &Paper) -> f64 {
    let mut score = saturating(paper.citation_count, 1000.0, 40.0)
        + saturating(paper.influential_citation_count, 100.0, 30.0);

    score += match paper.year {
        Some(year) if year < 2010 => 15.0,
        Some(year) if year < 2015 => 10.0,
        Some(year) if year < 2020 => 5.0,
        _ => 0.0,
    };

    if is_top_venue(paper.venue.as_deref()) {
        score += 15.0;
    }

    round1(score)
}

/// State-of-the-art relevance of a citing paper, relative to [`CITATION_REFERENCE_YEAR`]
pub fn calculate_citation_score(paper: &Paper) -> f64 {
    calculate_citation_score_at(paper, CITATION_REFERENCE_YEAR)
}

/// Citation-mode score with an explicit reference year
pub fn calculate_citation_score_at(paper: &Paper, reference_year: i32) -> f64 {
    let mut score = match paper.year {
        Some(year) if year >= reference_year => 40.0,
        Some(year) if year == reference_year - 1 => 30.0,
        Some(year) if year == reference_year - 2 => 20.0,
        Some(year) if year == reference_year - 3 => 10.0,
        _ => 0.0,
    };

    score += saturating(paper.citation_count, 50.0, 30.0);

    if is_top_venue(paper.venue.as_deref()) {
        score += 20.0;
    }
    if paper.is_open_access {
        score += 10.0;
    }

    round1(score)
}

/// Score every paper, attach `importance_score`, sort descending (stable)
pub fn rank_papers(papers: Vec<Paper>, mode: RankingMode) -> Vec<Paper> {
    rank_papers_at(papers, mode, CITATION_REFERENCE_YEAR)
}

pub fn rank_papers_at(mut papers: Vec<Paper>, mode: RankingMode, reference_year: i32) -> Vec<Paper> {
    for paper in &mut papers {
        let score = match mode {
            RankingMode::Reference => calculate_reference_score(paper),
            RankingMode::Citation => calculate_citation_score_at(paper, reference_year),
        };
        paper.importance_score = Some(score);
    }

    papers.sort_by(|a, b| {
        let a = a.importance_score.unwrap_or(0.0);
        let b = b.importance_score.unwrap_or(0.0);
        b.total_cmp(&a)
    });
    papers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaperBuilder, SourceType};

    fn paper(title: &str) -> PaperBuilder {
        PaperBuilder::new(title, title, SourceType::SemanticScholar)
    }

    #[test]
    fn test_reference_score_components() {
        let classic = paper("ImageNet")
            .citations(50_000)
            .influential_citations(5_000)
            .year(2009)
            .venue("CVPR")
            .build();
        assert_eq!(calculate_reference_score(&classic), 100.0);

        let modest = paper("m").citations(500).influential_citations(10).year(2016).build();
        // 20 + 3 + 5
        assert_eq!(calculate_reference_score(&modest), 28.0);
    }

    #[test]
    fn test_citation_score_components() {
        let fresh = paper("f")
            .year(2024)
            .citations(100)
            .venue("Advances in NeurIPS")
            .open_access(true, None)
            .build();
        assert_eq!(calculate_citation_score(&fresh), 100.0);

        let older = paper("o").year(2022).citations(5).build();
        // 20 + 3
        assert_eq!(calculate_citation_score(&older), 23.0);

        let stale = paper("s").year(2019).build();
        assert_eq!(calculate_citation_score(&stale), 0.0);
    }

    #[test]
    fn test_reference_year_is_a_parameter() {
        let p = paper("p").year(2025).build();
        assert_eq!(calculate_citation_score_at(&p, 2026), 30.0);
        assert_eq!(calculate_citation_score(&p), 40.0);
    }

    #[test]
    fn test_empty_paper_scores_zero() {
        let empty = Paper::new("", "", SourceType::SemanticScholar);
        assert_eq!(calculate_reference_score(&empty), 0.0);
        assert_eq!(calculate_citation_score(&empty), 0.0);
    }

    #[test]
    fn test_scores_bounded_and_monotone_in_citations() {
        let years = [None, Some(1990), Some(2012), Some(2018), Some(2021), Some(2030)];
        let venues = [None, Some("ICML"), Some("Some Journal")];

        for year in years {
            for venue in venues {
                let mut last = (0.0, 0.0);
                for citations in [0u32, 1, 10, 49, 50, 51, 999, 1000, 1001, u32::MAX] {
                    let mut builder = paper("x").citations(citations).influential_citations(citations);
                    if let Some(y) = year {
                        builder = builder.year(y);
                    }
                    if let Some(v) = venue {
                        builder = builder.venue(v);
                    }
                    let p = builder.build();
                    let scores = (calculate_reference_score(&p), calculate_citation_score(&p));

                    assert!((0.0..=100.0).contains(&scores.0));
                    assert!((0.0..=100.0).contains(&scores.1));
                    assert!(scores.0 >= last.0 && scores.1 >= last.1);
                    last = scores;
                }
            }
        }
    }

    #[test]
    fn test_top_venue_substring() {
        assert!(is_top_venue(Some("Proceedings of the AAAI Conference")));
        assert!(is_top_venue(Some("North American Chapter of the ACL")));
        assert!(!is_top_venue(Some("Nature")));
        assert!(!is_top_venue(None));
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let papers = vec![
            paper("a").citations(10).build(),
            paper("b").citations(2000).build(),
            paper("c").citations(10).build(),
            paper("d").citations(10).build(),
        ];
        let ranked = rank_papers(papers.clone(), RankingMode::Reference);
        let titles: Vec<&str> = ranked.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["b", "a", "c", "d"]);
        assert!(ranked.iter().all(|p| p.importance_score.is_some()));

        let again = rank_papers(papers, RankingMode::Reference);
        assert_eq!(ranked, again);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("reference".parse::<RankingMode>(), Ok(RankingMode::Reference));
        assert_eq!("Citation".parse::<RankingMode>(), Ok(RankingMode::Citation));
        assert!("other".parse::<RankingMode>().is_err());
    }
}
