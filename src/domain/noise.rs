//! Infrastructure domains that show up in nearly every page.

use std::collections::HashSet;

use super::RegistrableDomain;

/// Mid-level domains excluded from page-link comparisons.
///
/// Matching is on the mid-level label only, so `google.com` and `google.fi`
/// are both noise.
const DEFAULT_NOISE_MLDS: &[&str] = &[
    // search engines and their caches
    "google",
    "googleusercontent",
    "bing",
    "duckduckgo",
    "yahoo",
    "yandex",
    "webcache",
    // video and blogging platforms surfaced by any query
    "youtube",
    "blogger",
    // analytics, ads, fonts, CDNs
    "googleapis",
    "gstatic",
    "googletagmanager",
    "google-analytics",
    "doubleclick",
    "googlesyndication",
    "cloudflare",
    "akamaihd",
    "jsdelivr",
    "jquery",
    "bootstrapcdn",
    "fontawesome",
    "gravatar",
    // certificate and standards bodies
    "digicert",
    "symantec",
    "verisign",
    "w3",
    "schema",
    "mozilla",
    "adobe",
];

/// Fixed stoplist of noise domains, optionally extended from configuration.
#[derive(Debug, Clone)]
pub struct NoiseDomains {
    mlds: HashSet<String>,
}

impl Default for NoiseDomains {
    fn default() -> Self {
        Self {
            mlds: DEFAULT_NOISE_MLDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NoiseDomains {
    /// Default list plus additional mid-level labels (case-insensitive).
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut noise = Self::default();
        noise.mlds.extend(
            extra
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty()),
        );
        noise
    }

    pub fn contains_mld(&self, mld: &str) -> bool {
        self.mlds.contains(&mld.to_lowercase())
    }

    /// Whether a domain is noise. Domains without a mid-level label never
    /// take part in comparisons and count as noise too.
    pub fn contains(&self, domain: &RegistrableDomain) -> bool {
        match domain.mld() {
            Some(mld) => self.contains_mld(mld),
            None => true,
        }
    }
}
