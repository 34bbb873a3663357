//! Minimal live capture: fetch a URL over HTTP into a [`SiteRecord`].
//!
//! No rendering happens, so there is no screenshot and no navigation log
//! beyond the redirect chain endpoints.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::extraction::html;
use crate::models::SiteRecord;
use crate::search::build_client;

/// Errors fetching a site.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Site returned HTTP {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Response too large: {0} bytes")]
    TooLarge(usize),
}

/// Fetches a page, following redirects, and captures it as a record.
pub struct SiteFetcher {
    client: Client,
    max_html_bytes: usize,
}

impl SiteFetcher {
    pub fn new(
        timeout: Duration,
        user_agent: Option<&str>,
        max_html_bytes: usize,
    ) -> Result<Self, FetchError> {
        Ok(Self::with_client(
            build_client(timeout, user_agent)?,
            max_html_bytes,
        ))
    }

    pub fn with_client(client: Client, max_html_bytes: usize) -> Self {
        Self {
            client,
            max_html_bytes,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<SiteRecord, FetchError> {
        let start_url = normalize_url(url)?;
        info!("Fetching {}", start_url);

        let response = self.client.get(&start_url).send().await?;
        let landing_url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let source = response.text().await?;
        if source.len() > self.max_html_bytes {
            return Err(FetchError::TooLarge(source.len()));
        }
        debug!(landing = %landing_url, bytes = source.len(), "Fetched site");

        let mut record = SiteRecord::new(start_url.clone(), landing_url.clone());
        record.title = html::document_title(&source).unwrap_or_default();
        record.body_text = html::visible_text_lines(&source, true).join("\n");
        record.html_source = source;
        record.navigation_links.push(start_url.clone());
        if landing_url != start_url {
            record.navigation_links.push(landing_url);
        }
        record.accessed_at = Some(Utc::now());
        record.ensure_site_id();
        Ok(record)
    }
}

/// Add a scheme to bare domains and validate the result.
fn normalize_url(url: &str) -> Result<String, FetchError> {
    let trimmed = url.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };
    match url::Url::parse(&candidate) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {
            Ok(parsed.to_string())
        }
        _ => Err(FetchError::InvalidUrl(url.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com").unwrap(), "http://example.com/");
        assert_eq!(
            normalize_url(" https://example.com/login ").unwrap(),
            "https://example.com/login"
        );
        assert!(matches!(
            normalize_url("ftp://example.com/"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(normalize_url(""), Err(FetchError::InvalidUrl(_))));
    }
}
