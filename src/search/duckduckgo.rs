//! DuckDuckGo search engine.
//!
//! Uses the DuckDuckGo HTML endpoint, which needs no API key.

use std::sync::LazyLock;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use super::{SearchEngine, SearchError};

/// DuckDuckGo HTML search origin.
pub const DDG_BASE_URL: &str = "https://html.duckduckgo.com";

const DDG_SELF_DOMAINS: &[&str] = &["duckduckgo", "duck"];

static RESULT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("result selector should parse"));

/// Search engine backed by DuckDuckGo's HTML results.
pub struct DuckDuckGoEngine {
    client: Client,
    base_url: String,
}

impl DuckDuckGoEngine {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DDG_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Parse result links from the HTML page.
    fn parse_results(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        // Results are <a class="result__a"> elements
        let urls: Vec<String> = document
            .select(&RESULT_LINK)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(Self::extract_url)
            .collect();

        debug!("Parsed {} results from DuckDuckGo", urls.len());
        urls
    }

    /// Extract the target URL from DuckDuckGo's redirect link.
    fn extract_url(href: &str) -> Option<String> {
        // Redirects look like //duckduckgo.com/l/?uddg=<encoded_url>&rut=...
        if href.contains("duckduckgo.com/l/") {
            let uddg_start = href.find("uddg=")?;
            let encoded = &href[uddg_start + 5..];
            let end = encoded.find('&').unwrap_or(encoded.len());
            urlencoding::decode(&encoded[..end])
                .ok()
                .map(|s| s.into_owned())
        } else if href.starts_with("http://") || href.starts_with("https://") {
            Some(href.to_string())
        } else if href.starts_with("//") {
            Some(format!("https:{}", href))
        } else {
            None
        }
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoEngine {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn self_domains(&self) -> &[&str] {
        DDG_SELF_DOMAINS
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        debug!("DuckDuckGo search: {}", query);

        let response = self
            .client
            .post(format!("{}/html/", self.base_url))
            .form(&[("q", query), ("kl", "us-en")])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SearchError::RateLimited("duckduckgo".to_string()));
        }
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Parse(format!("Failed to read response text: {}", e)))?;
        Ok(Self::parse_results(&html))
    }
}
