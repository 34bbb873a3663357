//! Where searched domains come from: live search or results cached with
//! the record.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::keywords::KeywordSet;
use crate::models::SiteRecord;
use crate::search::{DomainReducer, DomainSetBuilder, SearchedDomainSet};

/// Supplies searched domains for the two analysis passes.
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    /// Domains for the base and augmented keyword sets, unioned.
    async fn first_pass_domains(
        &self,
        site: &SiteRecord,
        keywords: &KeywordSet,
        augmented: &KeywordSet,
    ) -> SearchedDomainSet;

    /// Domains for the OCR-derived keyword set.
    async fn ocr_pass_domains(&self, site: &SiteRecord, keywords: &KeywordSet)
        -> SearchedDomainSet;
}

/// Queries a search engine for every keyword set.
pub struct LiveAnalysis {
    builder: Arc<DomainSetBuilder>,
}

impl LiveAnalysis {
    pub fn new(builder: Arc<DomainSetBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl AnalysisSource for LiveAnalysis {
    async fn first_pass_domains(
        &self,
        _site: &SiteRecord,
        keywords: &KeywordSet,
        augmented: &KeywordSet,
    ) -> SearchedDomainSet {
        self.builder.build_all(&[keywords, augmented]).await
    }

    async fn ocr_pass_domains(
        &self,
        _site: &SiteRecord,
        keywords: &KeywordSet,
    ) -> SearchedDomainSet {
        self.builder.build(keywords).await
    }
}

/// Replays result URLs stored in the record's search cache.
///
/// Keyword sets are ignored; a missing cache entry contributes nothing.
pub struct PrecomputedAnalysis {
    reducer: DomainReducer,
}

impl PrecomputedAnalysis {
    pub fn new(reducer: DomainReducer) -> Self {
        Self { reducer }
    }

    fn replay(&self, label: &str, urls: Option<&Vec<String>>) -> SearchedDomainSet {
        match urls {
            Some(urls) => self.reducer.reduce(urls),
            None => {
                debug!(query = label, "No cached results");
                SearchedDomainSet::new()
            }
        }
    }
}

#[async_trait]
impl AnalysisSource for PrecomputedAnalysis {
    async fn first_pass_domains(
        &self,
        site: &SiteRecord,
        _keywords: &KeywordSet,
        _augmented: &KeywordSet,
    ) -> SearchedDomainSet {
        let cache = &site.search_cache;
        let mut domains = self.replay("keywords", cache.keywords.as_ref());
        domains.extend(self.replay("augmented", cache.augmented.as_ref()));
        domains
    }

    async fn ocr_pass_domains(
        &self,
        site: &SiteRecord,
        _keywords: &KeywordSet,
    ) -> SearchedDomainSet {
        self.replay("ocr", site.search_cache.ocr.as_ref())
    }
}
