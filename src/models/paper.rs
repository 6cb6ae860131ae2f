//! Paper model shared by the search and citation pipelines.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The backend a paper record was produced by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[serde(rename = "openalex")]
    OpenAlex,
    Arxiv,
    SemanticScholar,
}

impl SourceType {
    /// All backends, in the default request order
    pub const ALL: [SourceType; 3] = [
        SourceType::OpenAlex,
        SourceType::Arxiv,
        SourceType::SemanticScholar,
    ];

    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::OpenAlex => "OpenAlex",
            SourceType::Arxiv => "arXiv",
            SourceType::SemanticScholar => "Semantic Scholar",
        }
    }

    /// Returns the source identifier (for tool naming and request parsing)
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::OpenAlex => "openalex",
            SourceType::Arxiv => "arxiv",
            SourceType::SemanticScholar => "semantic_scholar",
        }
    }

    /// Icon used in markdown section headers
    pub fn icon(&self) -> &'static str {
        match self {
            SourceType::OpenAlex => "🔗",
            SourceType::Arxiv => "📝",
            SourceType::SemanticScholar => "🧠",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openalex" => Ok(SourceType::OpenAlex),
            "arxiv" => Ok(SourceType::Arxiv),
            "semantic_scholar" | "semantic" | "semanticscholar" | "s2" => {
                Ok(SourceType::SemanticScholar)
            }
            other => Err(format!(
                "unknown source '{}' (expected openalex, arxiv or semantic_scholar)",
                other
            )),
        }
    }
}

/// A research paper from any of the supported backends
///
/// The `source` tag is fixed at construction time; everything else is plain
/// data that adapters fill in from their API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Native identifier within the producing backend
    pub source_id: String,

    /// Paper title
    pub title: String,

    /// Author names, in byline order
    pub authors: Vec<String>,

    /// Abstract text
    pub r#abstract: Option<String>,

    /// Digital Object Identifier (bare, without resolver prefix)
    pub doi: Option<String>,

    /// arXiv identifier without version suffix
    pub arxiv_id: Option<String>,

    /// Publication year
    pub year: Option<i32>,

    /// Publication date (ISO format)
    pub published_date: Option<String>,

    /// Journal or conference name
    pub venue: Option<String>,

    /// Number of citing papers
    pub citation_count: u32,

    /// Number of influential citations (Semantic Scholar only)
    pub influential_citation_count: u32,

    /// Whether the full text is freely available
    pub is_open_access: bool,

    /// Free full-text URL
    pub open_access_url: Option<String>,

    /// Open-access flavour reported by the backend (gold, green, ...)
    pub oa_status: Option<String>,

    /// Paper landing page
    pub url: Option<String>,

    /// Work type (article, preprint, ...)
    pub work_type: Option<String>,

    /// Topics or categories
    pub topics: Vec<String>,

    source: SourceType,

    /// Ranking score in [0, 100], set only by the citation ranker
    pub importance_score: Option<f64>,
}

impl Paper {
    /// Create a new paper with required fields
    pub fn new(source_id: impl Into<String>, title: impl Into<String>, source: SourceType) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            authors: Vec::new(),
            r#abstract: None,
            doi: None,
            arxiv_id: None,
            year: None,
            published_date: None,
            venue: None,
            citation_count: 0,
            influential_citation_count: 0,
            is_open_access: false,
            open_access_url: None,
            oa_status: None,
            url: None,
            work_type: None,
            topics: Vec::new(),
            source,
            importance_score: None,
        }
    }

    /// The backend that produced this record
    pub fn source(&self) -> SourceType {
        self.source
    }

    /// Whether the record carries a usable title
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// DOI as a resolvable URL
    pub fn doi_url(&self) -> Option<String> {
        self.doi.as_ref().map(|d| format!("https://doi.org/{}", d))
    }

    /// First `limit` author names joined, with an "et al." suffix when truncated
    pub fn author_summary(&self, limit: usize) -> String {
        if self.authors.is_empty() {
            return "Unknown authors".to_string();
        }

        let shown = self
            .authors
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        if self.authors.len() > limit {
            format!("{} et al. ({} authors)", shown, self.authors.len())
        } else {
            shown
        }
    }
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(source_id: impl Into<String>, title: impl Into<String>, source: SourceType) -> Self {
        Self {
            paper: Paper::new(source_id, title, source),
        }
    }

    /// Set authors
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paper.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.paper.r#abstract = Some(abstract_text.into());
        self
    }

    /// Set DOI; a `https://doi.org/` prefix is stripped and empty values are ignored
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.paper.doi = clean_doi(&doi.into());
        self
    }

    /// Set arXiv ID; empty values are ignored
    pub fn arxiv_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.paper.arxiv_id = if id.trim().is_empty() {
            None
        } else {
            Some(id.trim().to_string())
        };
        self
    }

    /// Set publication year
    pub fn year(mut self, year: i32) -> Self {
        self.paper.year = Some(year);
        self
    }

    /// Set publication date
    pub fn published_date(mut self, date: impl Into<String>) -> Self {
        self.paper.published_date = Some(date.into());
        self
    }

    /// Set venue; empty values are ignored
    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        let venue = venue.into();
        if !venue.trim().is_empty() {
            self.paper.venue = Some(venue);
        }
        self
    }

    /// Set citation count
    pub fn citations(mut self, count: u32) -> Self {
        self.paper.citation_count = count;
        self
    }

    /// Set influential citation count
    pub fn influential_citations(mut self, count: u32) -> Self {
        self.paper.influential_citation_count = count;
        self
    }

    /// Mark as open access, optionally with a full-text URL
    pub fn open_access(mut self, is_open: bool, url: Option<String>) -> Self {
        self.paper.is_open_access = is_open;
        self.paper.open_access_url = url.filter(|u| !u.is_empty());
        self
    }

    /// Set open-access status label
    pub fn oa_status(mut self, status: impl Into<String>) -> Self {
        self.paper.oa_status = Some(status.into());
        self
    }

    /// Set landing page URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.is_empty() {
            self.paper.url = Some(url);
        }
        self
    }

    /// Set work type
    pub fn work_type(mut self, work_type: impl Into<String>) -> Self {
        self.paper.work_type = Some(work_type.into());
        self
    }

    /// Set topics
    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paper.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}

/// Strip resolver prefixes from a DOI
fn clean_doi(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let bare = [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ]
    .iter()
    .find_map(|prefix| {
        trimmed
            .get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| &trimmed[prefix.len()..])
    })
    .unwrap_or(trimmed);

    if bare.is_empty() {
        None
    } else {
        Some(bare.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_builder() {
        let paper = PaperBuilder::new("W123", "Test Paper", SourceType::OpenAlex)
            .authors(["John Doe", "Jane Smith"])
            .abstract_text("This is a test abstract.")
            .doi("https://doi.org/10.1234/test.1234")
            .year(2021)
            .citations(42)
            .build();

        assert_eq!(paper.source_id, "W123");
        assert_eq!(paper.title, "Test Paper");
        assert_eq!(paper.authors, vec!["John Doe", "Jane Smith"]);
        assert_eq!(paper.doi, Some("10.1234/test.1234".to_string()));
        assert_eq!(paper.citation_count, 42);
        assert_eq!(paper.source(), SourceType::OpenAlex);
        assert!(paper.importance_score.is_none());
    }

    #[test]
    fn test_empty_identifiers_are_dropped() {
        let paper = PaperBuilder::new("1", "T", SourceType::SemanticScholar)
            .doi("")
            .arxiv_id("  ")
            .venue("")
            .build();

        assert!(paper.doi.is_none());
        assert!(paper.arxiv_id.is_none());
        assert!(paper.venue.is_none());
    }

    #[test]
    fn test_author_summary() {
        let paper = PaperBuilder::new("1", "T", SourceType::OpenAlex)
            .authors(["A", "B", "C", "D", "E"])
            .build();
        assert_eq!(paper.author_summary(3), "A, B, C et al. (5 authors)");
        assert_eq!(paper.author_summary(5), "A, B, C, D, E");

        let anonymous = Paper::new("2", "T", SourceType::OpenAlex);
        assert_eq!(anonymous.author_summary(3), "Unknown authors");
    }

    #[test]
    fn test_source_type_parsing() {
        assert_eq!("openalex".parse::<SourceType>(), Ok(SourceType::OpenAlex));
        assert_eq!("ArXiv".parse::<SourceType>(), Ok(SourceType::Arxiv));
        assert_eq!(
            "semantic_scholar".parse::<SourceType>(),
            Ok(SourceType::SemanticScholar)
        );
        assert_eq!(
            "semantic".parse::<SourceType>(),
            Ok(SourceType::SemanticScholar)
        );
        assert!("pubmed".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_source_type_serde_ids() {
        let json = serde_json::to_string(&SourceType::ALL).unwrap();
        assert_eq!(json, r#"["openalex","arxiv","semantic_scholar"]"#);
    }
}
