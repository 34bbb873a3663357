//! Prominence matching: which searched domains the page itself refers to.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use tracing::debug;

use crate::domain::{NoiseDomains, RegistrableDomain};
use crate::extraction::{tokenize, Evidence};
use crate::keywords::KeywordSet;
use crate::search::SearchedDomainSet;

/// Prominent domains as `mld.ps` strings.
pub type ProminenceResult = BTreeSet<String>;

/// Why a searched domain was considered prominent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProminenceReason {
    /// Its mid-level label is one of the search keywords.
    Keyword,
    /// It matches a guess derived from the site's own domain name.
    DomainGuess,
    /// Its mid-level label occurs in the site's URLs.
    UrlToken,
    /// The page links to it (extended search only).
    LinkedDomain,
}

impl ProminenceReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::DomainGuess => "domain_guess",
            Self::UrlToken => "url_token",
            Self::LinkedDomain => "linked_domain",
        }
    }
}

/// Inputs shared by every domain checked in one matching pass.
pub struct ProminenceMatcher<'a> {
    pub evidence: &'a Evidence,
    pub keywords: &'a KeywordSet,
    pub mld_guesses: &'a IndexSet<String>,
    pub noise: &'a NoiseDomains,
}

impl ProminenceMatcher<'_> {
    /// First reason that makes `domain` prominent, if any.
    ///
    /// With `extend_search` the URL check also covers the title and pruned
    /// URLs, and domains linked from the page count unless they are noise.
    pub fn reason_for(
        &self,
        domain: &RegistrableDomain,
        extend_search: bool,
    ) -> Option<ProminenceReason> {
        let mld = normalized_mld(domain)?;

        if self.keywords.contains(&mld) {
            return Some(ProminenceReason::Keyword);
        }
        if self.mld_guesses.contains(&mld) {
            return Some(ProminenceReason::DomainGuess);
        }
        let url_tokens = if extend_search {
            &self.evidence.extended_url_tokens
        } else {
            &self.evidence.url_tokens
        };
        if url_tokens.contains(&mld) {
            return Some(ProminenceReason::UrlToken);
        }
        if extend_search
            && !self.noise.contains(domain)
            && self.evidence.link_domains.contains(domain)
        {
            return Some(ProminenceReason::LinkedDomain);
        }
        None
    }

    /// The prominent subset of `searched`.
    pub fn prominent_domains(
        &self,
        searched: &SearchedDomainSet,
        extend_search: bool,
    ) -> ProminenceResult {
        searched
            .iter()
            .filter_map(|domain| {
                let reason = self.reason_for(domain, extend_search)?;
                debug!(
                    domain = %domain,
                    reason = reason.as_str(),
                    "Prominent domain"
                );
                Some(domain.to_string())
            })
            .collect()
    }
}

/// Free-function form of [`ProminenceMatcher::prominent_domains`].
pub fn prominent_domains(
    evidence: &Evidence,
    keywords: &KeywordSet,
    mld_guesses: &IndexSet<String>,
    searched: &SearchedDomainSet,
    extend_search: bool,
    noise: &NoiseDomains,
) -> ProminenceResult {
    ProminenceMatcher {
        evidence,
        keywords,
        mld_guesses,
        noise,
    }
    .prominent_domains(searched, extend_search)
}

/// Mid-level label in token form (`t-mobile` becomes `tmobile`).
fn normalized_mld(domain: &RegistrableDomain) -> Option<String> {
    let merged = tokenize(domain.mld()?).concat();
    (!merged.is_empty()).then_some(merged)
}
