//! Keyword selection for external search.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::debug;

use super::stopwords::{detect_language, StopwordTable};
use crate::domain::{hostname_of, PublicSuffixList};
use crate::extraction::{tokenize, Evidence};
use crate::models::SiteRecord;

/// Default maximum number of keywords per query.
pub const DEFAULT_MAX_KEYWORDS: usize = 5;

/// Text tokens must be at least this long to count as a brand collision
/// with the site's own domain name.
const MIN_COLLISION_LEN: usize = 4;

/// Which evidence feeds the keyword ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordMode {
    /// URL, title and visible text.
    Base,
    /// Base plus copyright notices and linked brand names.
    Augmented,
    /// URL, title and copyright notices with OCR text in place of visible text.
    Ocr,
}

impl KeywordMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "keywords",
            Self::Augmented => "augmented",
            Self::Ocr => "ocr",
        }
    }
}

/// Ordered, deduplicated keyword tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    tokens: IndexSet<String>,
}

impl KeywordSet {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Space-joined query string, in insertion order.
    pub fn query_string(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }

    /// Union preserving the order of `self` first.
    pub fn union(&self, other: &KeywordSet) -> KeywordSet {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        KeywordSet { tokens }
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Where a candidate token was seen.
#[derive(Debug, Default)]
struct Candidate {
    first_seen: usize,
    sources: u8,
    in_title: bool,
    frequency: usize,
}

/// One evidence source taking part in the ranking.
struct TokenSource<'a> {
    tokens: Vec<&'a str>,
    is_title: bool,
    counts_frequency: bool,
}

impl<'a> TokenSource<'a> {
    fn new<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        Self {
            tokens: tokens.into_iter().map(String::as_str).collect(),
            is_title: false,
            counts_frequency: false,
        }
    }

    /// Title tokens count towards frequency and the title tier.
    fn title(mut self) -> Self {
        self.is_title = true;
        self.counts_frequency = true;
        self
    }

    fn counted(mut self) -> Self {
        self.counts_frequency = true;
        self
    }
}

/// Ranks evidence tokens into bounded keyword sets.
#[derive(Debug, Clone)]
pub struct KeywordSelector {
    psl: Arc<PublicSuffixList>,
    stopwords: Arc<StopwordTable>,
    max_count: usize,
}

impl KeywordSelector {
    pub fn new(psl: Arc<PublicSuffixList>, stopwords: Arc<StopwordTable>) -> Self {
        Self {
            psl,
            stopwords,
            max_count: DEFAULT_MAX_KEYWORDS,
        }
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Guess which brand names the landing domain is built from.
    ///
    /// Includes the mid-level label with hyphens merged, every hyphen- or
    /// dot-separated part of the host in front of the suffix, and title or
    /// text tokens contained in the mid-level label (`paypal` inside
    /// `paypalsecure`).
    pub fn mld_guesses(&self, site: &SiteRecord, evidence: &Evidence) -> IndexSet<String> {
        let mut guesses = IndexSet::new();
        let landing = site_url(site);
        let domain = self.psl.registrable_domain(landing);
        let Some(mld) = domain.mld() else {
            return guesses;
        };

        let merged: String = tokenize(mld).concat();
        if !merged.is_empty() {
            guesses.insert(merged.clone());
        }

        let host = hostname_of(landing);
        let prefix = host
            .strip_suffix(domain.suffix())
            .unwrap_or(&host)
            .trim_end_matches('.');
        for part in prefix.split(['.', '-']) {
            guesses.extend(tokenize(part));
        }

        for token in evidence.title_tokens.iter().chain(&evidence.text_tokens) {
            if token.chars().count() >= MIN_COLLISION_LEN && merged.contains(token.as_str()) {
                guesses.insert(token.clone());
            }
        }

        let language = self.page_language(evidence);
        guesses.retain(|token| !self.stopwords.is_stopword(language, token));
        guesses
    }

    /// Select keywords for `mode`.
    ///
    /// Domain guesses come first and are always kept; ranked evidence tokens
    /// fill the remaining slots up to the configured maximum. `ocr_text` is
    /// only read in [`KeywordMode::Ocr`].
    pub fn select(
        &self,
        site: &SiteRecord,
        evidence: &Evidence,
        mode: KeywordMode,
        ocr_text: Option<&str>,
    ) -> KeywordSet {
        let guesses = self.mld_guesses(site, evidence);
        let language = self.page_language(evidence);

        let ocr_tokens = match mode {
            KeywordMode::Ocr => ocr_text.map(tokenize).unwrap_or_default(),
            _ => Vec::new(),
        };
        let body: &[String] = match mode {
            KeywordMode::Ocr => &ocr_tokens,
            _ => &evidence.text_tokens,
        };

        let link_tokens = if mode == KeywordMode::Augmented {
            self.link_tokens(site, evidence)
        } else {
            Vec::new()
        };

        let mut sources = vec![
            TokenSource::new(&evidence.title_tokens).title(),
            TokenSource::new(body).counted(),
            TokenSource::new(&evidence.url_tokens),
        ];
        if matches!(mode, KeywordMode::Augmented | KeywordMode::Ocr) {
            sources.push(TokenSource::new(&evidence.copyright_tokens));
        }
        if !link_tokens.is_empty() {
            sources.push(TokenSource::new(&link_tokens));
        }

        let mut candidates: HashMap<&str, Candidate> = HashMap::new();
        let mut order = 0usize;
        for source in &sources {
            let mut seen_here: IndexSet<&str> = IndexSet::new();
            for token in source.tokens.iter().copied() {
                if guesses.contains(token) || self.stopwords.is_stopword(language, token) {
                    continue;
                }
                let entry = candidates.entry(token).or_insert_with(|| {
                    order += 1;
                    Candidate {
                        first_seen: order,
                        ..Default::default()
                    }
                });
                if source.counts_frequency {
                    entry.frequency += 1;
                }
                if source.is_title {
                    entry.in_title = true;
                }
                if seen_here.insert(token) {
                    entry.sources += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, Candidate)> = candidates.into_iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            let a_multi = a.sources >= 2;
            let b_multi = b.sources >= 2;
            b_multi
                .cmp(&a_multi)
                .then(b.in_title.cmp(&a.in_title))
                .then(b.sources.cmp(&a.sources))
                .then(b.frequency.cmp(&a.frequency))
                .then(a.first_seen.cmp(&b.first_seen))
        });

        let mut tokens: IndexSet<String> = guesses;
        for (token, _) in ranked {
            if tokens.len() >= self.max_count {
                break;
            }
            tokens.insert(token.to_string());
        }

        let keywords = KeywordSet { tokens };
        debug!(
            mode = mode.as_str(),
            language,
            keywords = %keywords.query_string(),
            "Selected keywords"
        );
        keywords
    }

    /// Brand tokens of linked domains other than the site's own.
    fn link_tokens(&self, site: &SiteRecord, evidence: &Evidence) -> Vec<String> {
        let own = self.psl.registrable_domain(site_url(site));
        let own_mld = own.mld();
        evidence
            .link_domains
            .iter()
            .filter_map(|d| d.mld())
            .filter(|mld| Some(*mld) != own_mld)
            .map(|mld| tokenize(mld).concat())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Two-letter language of the page text, English when there is none.
    pub fn page_language(&self, evidence: &Evidence) -> &'static str {
        if evidence.text_sample.trim().is_empty() {
            return super::stopwords::FALLBACK_LANGUAGE;
        }
        detect_language(&evidence.text_sample)
    }
}

/// Landing URL, or the start URL when the record has none.
fn site_url(site: &SiteRecord) -> &str {
    if site.landing_url.trim().is_empty() {
        &site.start_url
    } else {
        &site.landing_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NoiseDomains;
    use crate::extraction::EvidenceExtractor;

    fn selector() -> KeywordSelector {
        KeywordSelector::new(
            Arc::new(PublicSuffixList::builtin()),
            Arc::new(StopwordTable::builtin()),
        )
    }

    fn evidence_for(site: &SiteRecord) -> Evidence {
        EvidenceExtractor::new(
            Arc::new(PublicSuffixList::builtin()),
            Arc::new(NoiseDomains::default()),
        )
        .extract(site)
    }

    #[test]
    fn test_domain_guesses_lead_and_brand_follows() {
        let site = SiteRecord::new("http://paypa1-secure.net/login", "http://paypa1-secure.net/login")
            .with_title("PayPal: Log in")
            .with_body_text("Log in to your PayPal account");
        let evidence = evidence_for(&site);

        let keywords = selector().select(&site, &evidence, KeywordMode::Base, None);
        let tokens: Vec<&str> = keywords.iter().collect();
        assert_eq!(tokens[0], "paypasecure");
        assert!(keywords.contains("paypal"));
        assert!(!keywords.contains("login"));
        assert!(keywords.len() <= 5);
    }

    #[test]
    fn test_own_brand_domain() {
        let site = SiteRecord::new("http://paypal.com/login", "http://paypal.com/login")
            .with_title("Log in to your PayPal account");
        let evidence = evidence_for(&site);
        let guesses = selector().mld_guesses(&site, &evidence);
        assert_eq!(guesses.iter().collect::<Vec<_>>(), vec!["paypal"]);
    }

    #[test]
    fn test_collision_tokens_join_guesses() {
        let site = SiteRecord::new("http://a.example", "http://www.ebaysecure.com/")
            .with_title("eBay Sign in");
        let evidence = evidence_for(&site);
        let guesses = selector().mld_guesses(&site, &evidence);
        assert!(guesses.contains("ebaysecure"));
        assert!(guesses.contains("ebay"));
        assert!(!guesses.contains("www"));
    }

    #[test]
    fn test_guesses_kept_beyond_max_count() {
        let site = SiteRecord::new("http://x.example", "http://secure-update-center.example.org/")
            .with_title("Bank of Nowhere");
        let evidence = evidence_for(&site);
        let keywords = selector()
            .with_max_count(1)
            .select(&site, &evidence, KeywordMode::Base, None);
        assert!(keywords.contains("example"));
        assert!(keywords.contains("secure"));
        assert!(keywords.contains("update"));
        assert!(keywords.contains("center"));
        assert!(!keywords.contains("bank"));
    }

    #[test]
    fn test_empty_inputs_give_empty_set() {
        let site = SiteRecord::default();
        let evidence = evidence_for(&site);
        let keywords = selector().select(&site, &evidence, KeywordMode::Augmented, None);
        assert!(keywords.is_empty());
        assert_eq!(keywords.query_string(), "");
    }

    #[test]
    fn test_augmented_mixes_copyright_and_links() {
        let site = SiteRecord::new("http://a.example", "http://secure-update.example.org/")
            .with_title("Welcome")
            .with_body_text("Sign in to continue")
            .with_html(
                r#"<body><a href="https://www.ebay.com/help">Help</a>
                <footer>© 2015 eBay Inc.</footer></body>"#,
            );
        let evidence = evidence_for(&site);

        let base = selector().select(&site, &evidence, KeywordMode::Base, None);
        let augmented = selector().select(&site, &evidence, KeywordMode::Augmented, None);
        assert!(!base.contains("ebay"));
        assert!(augmented.contains("ebay"));
        assert_ne!(base.query_string(), augmented.query_string());
    }

    #[test]
    fn test_link_tokens_skip_own_domain_without_landing_url() {
        let site = SiteRecord::new("http://shopfront-login.net/", "").with_html(
            r#"<body><a href="https://shopfront-login.net/help">Help</a>
            <a href="https://www.ebay.com/">eBay</a></body>"#,
        );
        let evidence = evidence_for(&site);
        assert!(evidence
            .link_domains
            .iter()
            .any(|d| d.mld() == Some("shopfront-login")));

        let tokens = selector().link_tokens(&site, &evidence);
        assert_eq!(tokens, vec!["ebay".to_string()]);
    }

    #[test]
    fn test_ocr_mode_replaces_body_text() {
        let site = SiteRecord::new("http://a.example", "http://secure-update.example.org/")
            .with_body_text("Please continue");
        let evidence = evidence_for(&site);

        let base = selector().select(&site, &evidence, KeywordMode::Base, None);
        let ocr = selector().select(&site, &evidence, KeywordMode::Ocr, Some("ebay ebay shopping"));
        assert!(!base.contains("ebay"));
        assert!(ocr.contains("ebay"));
        assert!(!ocr.contains("please"));
    }

    #[test]
    fn test_multi_source_tokens_rank_first() {
        let site = SiteRecord::new("http://a.example", "http://a.example/")
            .with_title("Apple Store")
            .with_body_text("banana banana banana banana apple");
        let evidence = evidence_for(&site);
        let keywords = selector()
            .with_max_count(2)
            .select(&site, &evidence, KeywordMode::Base, None);
        // "a" has no usable guesses, so both slots are ranked tokens
        assert_eq!(keywords.iter().collect::<Vec<_>>(), vec!["apple", "store"]);
    }

    #[test]
    fn test_union_preserves_order() {
        let a: KeywordSet = ["paypal", "secure"].into_iter().collect();
        let b: KeywordSet = ["secure", "ebay"].into_iter().collect();
        assert_eq!(a.union(&b).query_string(), "paypal secure ebay");
    }
}
