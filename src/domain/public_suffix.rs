//! Public-suffix table and registrable-domain extraction.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

/// Public-suffix rules compiled into the binary.
const BUILTIN_LIST: &str = include_str!("../../data/public_suffix_list.dat");

/// A (mid-level domain, public suffix) pair, e.g. `("example", "co.uk")`.
///
/// Both parts are stored lowercase, so equality is case-insensitive.
/// `mld` is `None` when the hostname has no label in front of its suffix
/// (single-label hosts, bare suffixes, IP literals).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrableDomain {
    mld: Option<String>,
    suffix: String,
}

impl RegistrableDomain {
    pub fn new(mld: Option<&str>, suffix: &str) -> Self {
        Self {
            mld: mld.map(|m| m.to_lowercase()),
            suffix: suffix.to_lowercase(),
        }
    }

    /// The mid-level domain, if one exists.
    pub fn mld(&self) -> Option<&str> {
        self.mld.as_deref()
    }

    /// The public suffix.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for RegistrableDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mld {
            Some(mld) => write!(f, "{}.{}", mld, self.suffix),
            None => write!(f, "{}", self.suffix),
        }
    }
}

/// Immutable public-suffix reference table.
///
/// Load once and share by reference (`Arc`) across classification calls.
#[derive(Debug, Clone, Default)]
pub struct PublicSuffixList {
    rules: HashSet<String>,
    wildcards: HashSet<String>,
    exceptions: HashSet<String>,
}

impl PublicSuffixList {
    /// The rule set shipped with the crate.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_LIST)
    }

    /// Load a list from disk.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Parse PSL-formatted text. Comments and blank lines are ignored.
    pub fn parse(text: &str) -> Self {
        let mut list = Self::default();
        for line in text.lines() {
            // Rules end at the first whitespace
            let rule = match line.split_whitespace().next() {
                Some(rule) if !rule.starts_with("//") => rule.to_lowercase(),
                _ => continue,
            };
            if let Some(exception) = rule.strip_prefix('!') {
                list.exceptions.insert(exception.to_string());
            } else if let Some(parent) = rule.strip_prefix("*.") {
                list.wildcards.insert(parent.to_string());
            } else {
                list.rules.insert(rule);
            }
        }
        list
    }

    /// Number of rules loaded.
    pub fn len(&self) -> usize {
        self.rules.len() + self.wildcards.len() + self.exceptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `candidate` (dot-joined labels, lowercase) is a public suffix.
    pub fn is_suffix(&self, candidate: &str) -> bool {
        if self.exceptions.contains(candidate) {
            return false;
        }
        if self.rules.contains(candidate) {
            return true;
        }
        candidate
            .split_once('.')
            .is_some_and(|(_, parent)| self.wildcards.contains(parent))
    }

    /// Split a URL (or bare hostname) into its registrable domain.
    ///
    /// Suffixes are tried longest first; the first match gives the suffix and
    /// the label before it is the mid-level domain. Without any match the last
    /// label is taken as the suffix.
    pub fn registrable_domain(&self, url: &str) -> RegistrableDomain {
        let host = hostname_of(url);

        if host.parse::<IpAddr>().is_ok() {
            return RegistrableDomain::new(None, &host);
        }

        let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
        if labels.len() <= 1 {
            return RegistrableDomain::new(None, &host);
        }

        for i in 0..labels.len() {
            let suffix = labels[i..].join(".");
            if self.is_suffix(&suffix) {
                return if i == 0 {
                    RegistrableDomain::new(None, &host)
                } else {
                    RegistrableDomain::new(Some(labels[i - 1]), &suffix)
                };
            }
        }

        let n = labels.len();
        RegistrableDomain::new(Some(labels[n - 2]), labels[n - 1])
    }
}

/// Extract the lowercase hostname from a URL.
///
/// Falls back to treating the input as a bare domain (optionally with a
/// path, port or credentials) when it does not parse as an absolute URL.
pub fn hostname_of(url: &str) -> String {
    let trimmed = url.trim();

    if let Ok(parsed) = Url::parse(trimmed) {
        if let Some(host) = parsed.host_str() {
            return host
                .trim_start_matches('[')
                .trim_end_matches(']')
                .trim_end_matches('.')
                .to_lowercase();
        }
    }

    let without_scheme = match trimmed.find("://") {
        Some(idx) => &trimmed[idx + 3..],
        None => trimmed.trim_start_matches("//"),
    };
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = host_port.split(':').next().unwrap_or_default();

    host.trim_end_matches('.').to_lowercase()
}
