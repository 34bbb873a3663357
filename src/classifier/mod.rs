//! Site classification.
//!
//! [`Classifier`] ties evidence extraction, keyword selection, domain search
//! and prominence matching to the decision procedure in [`decision`]. Where
//! searched domains come from is abstracted by [`AnalysisSource`], so live
//! search and cached results share one procedure.

pub mod decision;
mod source;

pub use decision::{decide_escalated, decide_first_pass, Decision, PassOutcome};
pub use source::{AnalysisSource, LiveAnalysis, PrecomputedAnalysis};

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::domain::{NoiseDomains, PublicSuffixList, RegistrableDomain};
use crate::extraction::{Evidence, EvidenceExtractor};
use crate::keywords::{KeywordMode, KeywordSelector, KeywordSet, StopwordTable};
use crate::models::{ClassificationResult, SiteRecord};
use crate::ocr::TextRecognizer;
use crate::prominence::ProminenceMatcher;

/// Read-only tables shared by every classification.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub psl: Arc<PublicSuffixList>,
    pub stopwords: Arc<StopwordTable>,
    pub noise: Arc<NoiseDomains>,
}

impl ReferenceData {
    /// Tables compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            psl: Arc::new(PublicSuffixList::builtin()),
            stopwords: Arc::new(StopwordTable::builtin()),
            noise: Arc::new(NoiseDomains::default()),
        }
    }

    /// Load tables, preferring files on disk over the embedded copies.
    pub fn load(
        public_suffix_list: Option<&Path>,
        stopwords_dir: Option<&Path>,
        extra_noise: &[String],
    ) -> std::io::Result<Self> {
        let psl = match public_suffix_list {
            Some(path) => PublicSuffixList::load(path)?,
            None => PublicSuffixList::builtin(),
        };
        let stopwords = match stopwords_dir {
            Some(dir) => StopwordTable::load_dir(dir)?,
            None => StopwordTable::builtin(),
        };
        debug!(suffix_rules = psl.len(), "Loaded reference data");
        Ok(Self {
            psl: Arc::new(psl),
            stopwords: Arc::new(stopwords),
            noise: Arc::new(NoiseDomains::with_extra(extra_noise)),
        })
    }
}

/// The three keyword sets a record yields.
#[derive(Debug, Clone)]
pub struct KeywordReport {
    pub mld_guesses: IndexSet<String>,
    pub keywords: KeywordSet,
    pub augmented: KeywordSet,
    /// Only when OCR text is cached on the record.
    pub ocr: Option<KeywordSet>,
}

/// Classifies site records as phish, suspicious or not phish.
pub struct Classifier {
    reference: ReferenceData,
    extractor: EvidenceExtractor,
    selector: KeywordSelector,
    analysis: Arc<dyn AnalysisSource>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl Classifier {
    pub fn new(reference: ReferenceData, analysis: Arc<dyn AnalysisSource>) -> Self {
        let extractor = EvidenceExtractor::new(reference.psl.clone(), reference.noise.clone());
        let selector = KeywordSelector::new(reference.psl.clone(), reference.stopwords.clone());
        Self {
            reference,
            extractor,
            selector,
            analysis,
            recognizer: None,
        }
    }

    /// Enable OCR escalation.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_max_keywords(mut self, max_keywords: usize) -> Self {
        self.selector = self.selector.with_max_count(max_keywords);
        self
    }

    pub fn with_max_html_bytes(mut self, max_html_bytes: usize) -> Self {
        self.extractor = self.extractor.with_max_html_bytes(max_html_bytes);
        self
    }

    pub fn extract_evidence(&self, site: &SiteRecord) -> Evidence {
        self.extractor.extract(site)
    }

    /// Keyword sets for inspection, without searching.
    pub fn keyword_report(&self, site: &SiteRecord) -> KeywordReport {
        let evidence = self.extractor.extract(site);
        KeywordReport {
            mld_guesses: self.selector.mld_guesses(site, &evidence),
            keywords: self.selector.select(site, &evidence, KeywordMode::Base, None),
            augmented: self
                .selector
                .select(site, &evidence, KeywordMode::Augmented, None),
            ocr: site.ocr_text.as_deref().map(|text| {
                self.selector
                    .select(site, &evidence, KeywordMode::Ocr, Some(text))
            }),
        }
    }

    /// Classify a site.
    ///
    /// `None` (no record could be obtained) and records without any URL are
    /// `Unresolved`. OCR runs at most once per record: its normalized text
    /// is stored in `ocr_text` and reused by later calls. Never fails;
    /// component errors degrade to empty evidence.
    pub async fn classify(
        &self,
        site: Option<&mut SiteRecord>,
        screenshot: Option<&Path>,
    ) -> ClassificationResult {
        let Some(site) = site else {
            info!("No site record available");
            return ClassificationResult::unresolved();
        };
        if site.landing_url.trim().is_empty() && site.start_url.trim().is_empty() {
            warn!("Site record has no URL");
            return ClassificationResult::unresolved();
        }

        let evidence = self.extractor.extract(site);
        let own_domain = self.own_domain(site);
        let guesses = self.selector.mld_guesses(site, &evidence);
        let keywords = self.selector.select(site, &evidence, KeywordMode::Base, None);
        let augmented = self
            .selector
            .select(site, &evidence, KeywordMode::Augmented, None);
        info!(
            site = %site.landing_url,
            own_domain = %own_domain,
            has_password_field = evidence.has_password_field,
            keywords = %keywords.query_string(),
            augmented = %augmented.query_string(),
            "Classifying"
        );

        let searched = self
            .analysis
            .first_pass_domains(site, &keywords, &augmented)
            .await;

        // Password pages match against both keyword sets
        let match_keywords = if evidence.has_password_field {
            keywords.union(&augmented)
        } else {
            keywords
        };
        let prominent = self
            .matcher(&evidence, &match_keywords, &guesses)
            .prominent_domains(&searched, false);
        let first = PassOutcome {
            searched,
            prominent,
        };

        match decide_first_pass(&own_domain, evidence.has_password_field, &first) {
            Decision::Final(result) => {
                info!(result = %result, "Decided on first pass");
                result
            }
            Decision::Escalate => {
                info!("First pass inconclusive on password page, escalating to OCR");
                let language = self.selector.page_language(&evidence);
                let ocr_text = self.ocr_text(site, screenshot, language).await;
                let ocr_keywords =
                    self.selector
                        .select(site, &evidence, KeywordMode::Ocr, Some(&ocr_text));
                let searched = self.analysis.ocr_pass_domains(site, &ocr_keywords).await;
                let prominent = self
                    .matcher(&evidence, &ocr_keywords, &guesses)
                    .prominent_domains(&searched, true);
                let result = decide_escalated(
                    &own_domain,
                    &PassOutcome {
                        searched,
                        prominent,
                    },
                );
                info!(result = %result, "Decided after OCR pass");
                result
            }
        }
    }

    fn own_domain(&self, site: &SiteRecord) -> RegistrableDomain {
        let url = if site.landing_url.trim().is_empty() {
            &site.start_url
        } else {
            &site.landing_url
        };
        self.reference.psl.registrable_domain(url)
    }

    fn matcher<'a>(
        &'a self,
        evidence: &'a Evidence,
        keywords: &'a KeywordSet,
        guesses: &'a IndexSet<String>,
    ) -> ProminenceMatcher<'a> {
        ProminenceMatcher {
            evidence,
            keywords,
            mld_guesses: guesses,
            noise: &self.reference.noise,
        }
    }

    /// Cached OCR text, or a fresh run stored on the record.
    ///
    /// Failed runs are not cached and contribute empty text.
    async fn ocr_text(
        &self,
        site: &mut SiteRecord,
        screenshot: Option<&Path>,
        language: &str,
    ) -> String {
        if let Some(text) = &site.ocr_text {
            debug!("Reusing cached OCR text");
            return text.clone();
        }
        let (Some(recognizer), Some(screenshot)) = (&self.recognizer, screenshot) else {
            debug!("OCR unavailable for this record");
            return String::new();
        };
        match recognizer.extract_text(screenshot, language).await {
            Ok(text) => {
                site.ocr_text = Some(text.clone());
                text
            }
            Err(e) => {
                warn!("OCR failed for {}: {}", screenshot.display(), e);
                String::new()
            }
        }
    }
}
