//! Captured site visit.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// A captured visit to a site: URLs, sources and rendered text.
///
/// Field aliases accept records written by older capture tooling
/// (`starturl`, `landurl`, `source`, `loglinks`, ...). Absent collections
/// deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    #[serde(default, alias = "siteid")]
    pub site_id: String,
    #[serde(alias = "starturl")]
    pub start_url: String,
    #[serde(alias = "landurl")]
    pub landing_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "source")]
    pub html_source: String,
    /// Secondary sources fetched while rendering, keyed by URL.
    #[serde(default, alias = "external_source")]
    pub external_sources: BTreeMap<String, String>,
    /// URLs observed in the navigation log.
    #[serde(default, alias = "loglinks")]
    pub navigation_links: Vec<String>,
    #[serde(default, alias = "text")]
    pub body_text: String,
    /// Normalized OCR token string, set once OCR has run for this record.
    #[serde(default, alias = "ocr", skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(default, skip_serializing_if = "SearchCache::is_empty")]
    pub search_cache: SearchCache,
    #[serde(
        default,
        alias = "access_time",
        deserialize_with = "deserialize_access_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub accessed_at: Option<DateTime<Utc>>,
}

impl SiteRecord {
    pub fn new(start_url: impl Into<String>, landing_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            landing_url: landing_url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_source = html.into();
        self
    }

    pub fn with_body_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = text.into();
        self
    }

    /// Stable identifier derived from the URLs and main source.
    pub fn compute_site_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.start_url.as_bytes());
        hasher.update(self.landing_url.as_bytes());
        hasher.update(self.html_source.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Fill in `site_id` if the record does not carry one.
    pub fn ensure_site_id(&mut self) -> &str {
        if self.site_id.is_empty() {
            self.site_id = self.compute_site_id();
        }
        &self.site_id
    }

    /// The main source followed by every secondary source.
    pub fn html_sources(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((self.landing_url.as_str(), self.html_source.as_str())).chain(
            self.external_sources
                .iter()
                .map(|(url, html)| (url.as_str(), html.as_str())),
        )
    }

    pub fn has_ocr_text(&self) -> bool {
        self.ocr_text.is_some()
    }
}

/// Search result URLs captured with the record, replayed instead of
/// querying a live engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCache {
    #[serde(default, alias = "urls_keywords", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, alias = "urls_augmented", skip_serializing_if = "Option::is_none")]
    pub augmented: Option<Vec<String>>,
    #[serde(default, alias = "urls_ocr", skip_serializing_if = "Option::is_none")]
    pub ocr: Option<Vec<String>>,
}

impl SearchCache {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_none() && self.augmented.is_none() && self.ocr.is_none()
    }
}

/// Accept RFC 3339 as well as the `YYYY-MM-DD HH:MM:SS` form older captures
/// wrote. Anything else is dropped rather than failing the whole record.
fn deserialize_access_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_access_time(&s)))
}

fn parse_access_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_field_names() {
        let json = r#"{
            "siteid": "abc",
            "starturl": "http://short.example/x",
            "landurl": "http://paypa1-secure.net/login",
            "title": "PayPal",
            "source": "<html></html>",
            "external_source": {"http://paypa1-secure.net/frame": "<input type='password'>"},
            "loglinks": ["http://cdn.example.net/a.js"],
            "text": "Log in to your account",
            "ocr": "paypal login",
            "access_time": "2015-03-02 10:11:12"
        }"#;
        let record: SiteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.site_id, "abc");
        assert_eq!(record.landing_url, "http://paypa1-secure.net/login");
        assert_eq!(record.external_sources.len(), 1);
        assert_eq!(record.navigation_links.len(), 1);
        assert_eq!(record.body_text, "Log in to your account");
        assert_eq!(record.ocr_text.as_deref(), Some("paypal login"));
        assert!(record.accessed_at.is_some());
    }

    #[test]
    fn test_missing_optional_fields_default_to_empty() {
        let json = r#"{"start_url": "http://a.example", "landing_url": "http://b.example"}"#;
        let record: SiteRecord = serde_json::from_str(json).unwrap();
        assert!(record.external_sources.is_empty());
        assert!(record.navigation_links.is_empty());
        assert!(record.ocr_text.is_none());
        assert!(record.search_cache.is_empty());
    }

    #[test]
    fn test_unparseable_access_time_is_dropped() {
        let json = r#"{"starturl": "a", "landurl": "b", "access_time": "yesterday"}"#;
        let record: SiteRecord = serde_json::from_str(json).unwrap();
        assert!(record.accessed_at.is_none());
    }

    #[test]
    fn test_search_cache_aliases() {
        let json = r#"{"starturl": "a", "landurl": "b",
            "search_cache": {"urls_keywords": ["https://www.paypal.com/"], "urls_ocr": []}}"#;
        let record: SiteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.search_cache.keywords,
            Some(vec!["https://www.paypal.com/".to_string()])
        );
        assert_eq!(record.search_cache.augmented, None);
        assert_eq!(record.search_cache.ocr, Some(vec![]));
    }

    #[test]
    fn test_site_id_is_stable() {
        let mut record = SiteRecord::new("http://a.example", "http://b.example").with_html("<p>");
        let expected = record.compute_site_id();
        assert_eq!(expected.len(), 64);
        assert_eq!(record.ensure_site_id(), expected);

        record.site_id = "kept".to_string();
        assert_eq!(record.ensure_site_id(), "kept");
    }

    #[test]
    fn test_html_sources_main_first() {
        let mut record = SiteRecord::new("s", "http://main.example").with_html("main");
        record
            .external_sources
            .insert("http://frame.example".to_string(), "frame".to_string());
        let sources: Vec<_> = record.html_sources().collect();
        assert_eq!(
            sources,
            vec![("http://main.example", "main"), ("http://frame.example", "frame")]
        );
    }
}
