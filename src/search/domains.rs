//! Reduction of search results to registrable-domain sets.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{SearchEngine, SearchError};
use crate::domain::{PublicSuffixList, RegistrableDomain};
use crate::keywords::KeywordSet;

/// Domains surfaced by one or more searches.
pub type SearchedDomainSet = BTreeSet<RegistrableDomain>;

/// Retry and pacing for search calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    /// Base delay, doubled after every failed attempt.
    pub backoff: Duration,
    /// Pause before every query.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff: Duration::from_millis(500),
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
            delay: Duration::ZERO,
        }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

/// Main-level domains present in nearly every result page, whatever the query.
///
/// Kept separate from [`NoiseDomains`](crate::domain::NoiseDomains): brands
/// like yahoo or adobe are page noise but legitimate search answers.
pub const RESULT_STOP_MLDS: &[&str] = &[
    "google",
    "youtube",
    "blogger",
    "googleusercontent",
    "schema",
];

/// Reduces result URLs to registrable domains, dropping the engine's own
/// domains and the fixed result stoplist.
#[derive(Debug, Clone)]
pub struct DomainReducer {
    psl: Arc<PublicSuffixList>,
    excluded_mlds: HashSet<String>,
}

impl DomainReducer {
    pub fn new(psl: Arc<PublicSuffixList>, self_domains: &[&str]) -> Self {
        let excluded_mlds = RESULT_STOP_MLDS
            .iter()
            .chain(self_domains)
            .map(|d| d.to_lowercase())
            .collect();
        Self { psl, excluded_mlds }
    }

    pub fn psl(&self) -> &PublicSuffixList {
        &self.psl
    }

    pub fn reduce<S: AsRef<str>>(&self, urls: &[S]) -> SearchedDomainSet {
        urls.iter()
            .map(|url| self.psl.registrable_domain(url.as_ref()))
            .filter(|domain| !self.is_excluded(domain))
            .collect()
    }

    fn is_excluded(&self, domain: &RegistrableDomain) -> bool {
        match domain.mld() {
            Some(mld) => self.excluded_mlds.contains(mld),
            None => true,
        }
    }
}

/// Issues keyword searches and aggregates their domains.
pub struct DomainSetBuilder {
    engine: Arc<dyn SearchEngine>,
    reducer: DomainReducer,
    retry: RetryPolicy,
}

impl DomainSetBuilder {
    pub fn new(engine: Arc<dyn SearchEngine>, psl: Arc<PublicSuffixList>) -> Self {
        let reducer = DomainReducer::new(psl, engine.self_domains());
        Self {
            engine,
            reducer,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn reducer(&self) -> &DomainReducer {
        &self.reducer
    }

    /// Raw result URLs for a keyword set.
    ///
    /// Empty sets issue no query. Failures are retried with exponential
    /// backoff; once retries run out the query contributes nothing.
    pub async fn search_urls(&self, keywords: &KeywordSet) -> Vec<String> {
        if keywords.is_empty() {
            debug!("Empty keyword set, no search issued");
            return Vec::new();
        }
        let query = keywords.query_string();

        if !self.retry.delay.is_zero() {
            tokio::time::sleep(self.retry.delay).await;
        }

        let mut attempt = 0;
        loop {
            match self.engine.search(&query).await {
                Ok(urls) => {
                    info!(
                        engine = self.engine.name(),
                        query = %query,
                        results = urls.len(),
                        "Search complete"
                    );
                    return urls;
                }
                Err(e) if attempt < self.retry.retries && is_retryable(&e) => {
                    let wait = self.retry.backoff_for(attempt);
                    warn!(
                        "{} search for '{}' failed (attempt {}): {}; retrying in {:?}",
                        self.engine.name(),
                        query,
                        attempt + 1,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "{} search for '{}' failed: {}",
                        self.engine.name(),
                        query,
                        e
                    );
                    return Vec::new();
                }
            }
        }
    }

    /// Domains for one keyword set.
    pub async fn build(&self, keywords: &KeywordSet) -> SearchedDomainSet {
        let urls = self.search_urls(keywords).await;
        let domains = self.reducer.reduce(&urls);
        debug!(
            query = %keywords.query_string(),
            domains = ?domains.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            "Query domains"
        );
        domains
    }

    /// Union of the domains for several keyword sets. Sets that serialize to
    /// an already searched query string are not searched again.
    pub async fn build_all(&self, sets: &[&KeywordSet]) -> SearchedDomainSet {
        let mut searched = HashSet::new();
        let mut domains = SearchedDomainSet::new();
        for keywords in sets {
            if !searched.insert(keywords.query_string()) {
                debug!(query = %keywords.query_string(), "Skipping repeated query");
                continue;
            }
            domains.extend(self.build(keywords).await);
        }
        domains
    }
}

fn is_retryable(error: &SearchError) -> bool {
    !matches!(error, SearchError::Config(_) | SearchError::Parse(_))
}
