//! Registry for the available paper-search backends.

use std::collections::HashMap;
use std::sync::Arc;

use super::{ArxivSource, OpenAlexSource, SemanticScholarSource, Source, SourceError};
use crate::config::Config;
use crate::models::SourceType;

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const CITATIONS = 1 << 1;
        const DOI_LOOKUP = 1 << 2;
        const ARXIV_LOOKUP = 1 << 3;
        const TITLE_LOOKUP = 1 << 4;
    }
}

/// Registry of backends, keyed by provenance tag
///
/// Iteration always follows [`SourceType::ALL`] order so reports are stable.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceType, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the three production backends configured from `config`
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let mut registry = Self::new();

        registry.register(Arc::new(OpenAlexSource::from_config(config)?));
        registry.register(Arc::new(ArxivSource::from_config(config)?));
        registry.register(Arc::new(SemanticScholarSource::from_config(config)?));

        Ok(registry)
    }

    /// Register a source, replacing any previous one with the same tag
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.source_type(), source);
    }

    /// Get a source by tag
    pub fn get(&self, source_type: SourceType) -> Option<&Arc<dyn Source>> {
        self.sources.get(&source_type)
    }

    /// Get a source by tag, returning an error if it is not registered
    pub fn get_required(&self, source_type: SourceType) -> Result<&Arc<dyn Source>, SourceError> {
        self.get(source_type).ok_or_else(|| {
            SourceError::InvalidRequest(format!("Source '{}' is not registered", source_type.id()))
        })
    }

    /// All registered sources in canonical order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        SourceType::ALL.iter().filter_map(|t| self.sources.get(t))
    }

    /// Sources that support a specific capability
    pub fn with_capability(&self, capability: SourceCapabilities) -> Vec<&Arc<dyn Source>> {
        self.all()
            .filter(|s| s.capabilities().contains(capability))
            .collect()
    }

    /// Sources that support citation lookups
    pub fn with_citations(&self) -> Vec<&Arc<dyn Source>> {
        self.with_capability(SourceCapabilities::CITATIONS)
    }

    /// Backend used by the citation pipeline
    ///
    /// Semantic Scholar when registered, otherwise the first citation-capable source.
    pub fn citation_source(&self) -> Option<&Arc<dyn Source>> {
        self.get(SourceType::SemanticScholar)
            .filter(|s| s.supports_citations())
            .or_else(|| self.with_citations().into_iter().next())
    }

    /// Check if a source is registered
    pub fn has(&self, source_type: SourceType) -> bool {
        self.sources.contains_key(&source_type)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
