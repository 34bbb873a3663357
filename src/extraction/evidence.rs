//! Evidence extraction from a site record.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, warn};

use super::html;
use super::tokenize::{prune_url, tokenize};
use crate::domain::{NoiseDomains, PublicSuffixList, RegistrableDomain};
use crate::models::SiteRecord;

/// Default upper bound on a single HTML source.
pub const DEFAULT_MAX_HTML_BYTES: usize = 5 * 1024 * 1024;

/// Normalized token sets and structural signals for one site.
///
/// Every token satisfies the tokenizer contract: lowercase letters only,
/// at least three characters.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    /// Tokens of start URL and landing URL.
    pub url_tokens: IndexSet<String>,
    /// URL tokens plus title tokens and protocol/extension-stripped URLs.
    pub extended_url_tokens: IndexSet<String>,
    /// Title tokens, repeats kept.
    pub title_tokens: Vec<String>,
    /// Visible-text tokens, repeats kept, in document order.
    pub text_tokens: Vec<String>,
    pub copyright_tokens: IndexSet<String>,
    pub has_password_field: bool,
    /// Domains linked from any source or seen in the navigation log,
    /// infrastructure noise excluded.
    pub link_domains: BTreeSet<RegistrableDomain>,
    /// Visible text used for language identification.
    pub text_sample: String,
}

impl Evidence {
    /// Iterate over every token set, for invariant checks and debugging.
    pub fn all_tokens(&self) -> impl Iterator<Item = &String> {
        self.url_tokens
            .iter()
            .chain(&self.extended_url_tokens)
            .chain(&self.title_tokens)
            .chain(&self.text_tokens)
            .chain(&self.copyright_tokens)
    }
}

/// Turns site records into [`Evidence`].
///
/// Holds read-only references to the suffix table and noise stoplist so one
/// extractor can serve concurrent classifications.
#[derive(Debug, Clone)]
pub struct EvidenceExtractor {
    psl: Arc<PublicSuffixList>,
    noise: Arc<NoiseDomains>,
    max_html_bytes: usize,
}

impl EvidenceExtractor {
    pub fn new(psl: Arc<PublicSuffixList>, noise: Arc<NoiseDomains>) -> Self {
        Self {
            psl,
            noise,
            max_html_bytes: DEFAULT_MAX_HTML_BYTES,
        }
    }

    pub fn with_max_html_bytes(mut self, max: usize) -> Self {
        self.max_html_bytes = max;
        self
    }

    pub fn extract(&self, site: &SiteRecord) -> Evidence {
        let sources: Vec<(&str, &str)> = site
            .html_sources()
            .filter(|(url, source)| self.is_usable(url, source))
            .collect();
        let main_source = sources
            .first()
            .filter(|(url, _)| *url == site.landing_url)
            .map(|(_, source)| *source);

        let url_tokens: IndexSet<String> =
            tokenize(&format!("{} {}", site.start_url, site.landing_url))
                .into_iter()
                .collect();

        let title = if site.title.trim().is_empty() {
            main_source.and_then(html::document_title).unwrap_or_default()
        } else {
            site.title.clone()
        };
        let title_tokens = tokenize(&title);

        let mut extended_url_tokens = url_tokens.clone();
        extended_url_tokens.extend(title_tokens.iter().cloned());
        for url in [&site.start_url, &site.landing_url] {
            extended_url_tokens.extend(tokenize(&prune_url(url)));
        }

        let lines = self.text_lines(site, main_source, &sources);
        let text_tokens: Vec<String> = lines.iter().flat_map(|line| tokenize(line)).collect();

        let has_password_field = sources
            .iter()
            .any(|(_, source)| html::has_password_input(source));
        debug!(
            site = %site.landing_url,
            has_password_field,
            "Password field scan complete"
        );

        let copyright_tokens: IndexSet<String> = sources
            .iter()
            .flat_map(|(_, source)| html::copyright_notices(source))
            .flat_map(|notice| tokenize(&notice))
            .collect();

        let link_domains = self.link_domains(site, &sources);

        let text_sample = lines
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        Evidence {
            url_tokens,
            extended_url_tokens,
            title_tokens,
            text_tokens,
            copyright_tokens,
            has_password_field,
            link_domains,
            text_sample,
        }
    }

    /// Body text when captured, otherwise the main source's visible text;
    /// then lines from secondary sources not already present.
    fn text_lines(
        &self,
        site: &SiteRecord,
        main_source: Option<&str>,
        sources: &[(&str, &str)],
    ) -> IndexSet<String> {
        let mut lines: IndexSet<String> = if site.body_text.trim().is_empty() {
            main_source
                .map(|source| html::visible_text_lines(source, true))
                .unwrap_or_default()
                .into_iter()
                .collect()
        } else {
            site.body_text
                .lines()
                .map(|line| html::collapse_whitespace(&html::remove_urls(line)))
                .filter(|line| !line.is_empty())
                .collect()
        };

        let secondary = sources.iter().filter(|(url, _)| *url != site.landing_url);
        for (_, source) in secondary {
            lines.extend(html::visible_text_lines(source, true));
        }
        lines
    }

    fn link_domains(
        &self,
        site: &SiteRecord,
        sources: &[(&str, &str)],
    ) -> BTreeSet<RegistrableDomain> {
        sources
            .iter()
            .flat_map(|(_, source)| html::embedded_urls(source))
            .chain(site.navigation_links.iter().cloned())
            .filter(|url| is_absolute_link(url))
            .map(|url| self.psl.registrable_domain(&url))
            .filter(|domain| !self.noise.contains(domain))
            .collect()
    }

    fn is_usable(&self, url: &str, source: &str) -> bool {
        if source.len() > self.max_html_bytes {
            warn!(
                source = url,
                bytes = source.len(),
                "Skipping oversized HTML source"
            );
            return false;
        }
        if source.contains('\0') {
            warn!(source = url, "Skipping binary content in HTML source");
            return false;
        }
        true
    }
}

fn is_absolute_link(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}
