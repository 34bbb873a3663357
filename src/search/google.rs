//! Google web search via the plain HTML results page.

use std::sync::LazyLock;

use async_trait::async_trait;
use indexmap::IndexSet;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use super::{SearchEngine, SearchError};

/// Google search origin.
pub const GOOGLE_BASE_URL: &str = "https://www.google.com";

/// Google's own properties, caches and redirect previews.
const GOOGLE_SELF_DOMAINS: &[&str] = &[
    "google",
    "googleusercontent",
    "webcache",
    "gstatic",
    "googleapis",
    "youtube",
    "blogger",
    "schema",
];

static RESULT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s'"]*"#).expect("result URL regex should compile"));

/// Search engine scraping raw result URLs out of Google's HTML.
pub struct GoogleEngine {
    client: Client,
    base_url: String,
}

impl GoogleEngine {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, GOOGLE_BASE_URL)
    }

    /// Point the engine at another origin (a mirror or a test server).
    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Every absolute URL on the page, in order of appearance.
    ///
    /// Matches that run into markup or escapes (`<`, `\`) are highlighted
    /// fragments rather than links and are skipped.
    fn parse_results(html: &str) -> Vec<String> {
        let urls: IndexSet<String> = RESULT_URL
            .find_iter(html)
            .map(|m| m.as_str())
            .filter(|url| !url.contains('<') && !url.contains('\\'))
            .map(|url| url.replace("&amp;", "&"))
            .collect();
        urls.into_iter().collect()
    }
}

#[async_trait]
impl SearchEngine for GoogleEngine {
    fn name(&self) -> &str {
        "google"
    }

    fn self_domains(&self) -> &[&str] {
        GOOGLE_SELF_DOMAINS
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        debug!("Google search: {}", query);

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("hl", "en")])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SearchError::RateLimited("google".to_string()));
        }
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Parse(format!("Failed to read response text: {}", e)))?;
        let urls = Self::parse_results(&html);
        debug!("Parsed {} URLs from Google", urls.len());
        Ok(urls)
    }
}
