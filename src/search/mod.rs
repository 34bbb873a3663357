//! External web search and domain-set construction.
//!
//! Engines turn a keyword query into raw result URLs; [`DomainSetBuilder`]
//! reduces those to registrable domains with engine self-references and a
//! short stoplist removed.

mod client;
mod domains;
mod duckduckgo;
mod google;

pub use client::{build_client, resolve_user_agent, BROWSER_USER_AGENTS, USER_AGENT};
pub use domains::{
    DomainReducer, DomainSetBuilder, RetryPolicy, SearchedDomainSet, RESULT_STOP_MLDS,
};
pub use duckduckgo::{DuckDuckGoEngine, DDG_BASE_URL};
pub use google::{GoogleEngine, GOOGLE_BASE_URL};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from search engines.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search engine returned HTTP {0}")]
    Status(u16),

    #[error("Rate limited by {0}")]
    RateLimited(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A keyword-to-URLs lookup service.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Mid-level labels of the engine's own sites, caches and previews.
    fn self_domains(&self) -> &[&str];

    /// Raw result URLs for a query, navigational chrome included.
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError>;
}

/// Connection settings for the built-in engines.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Origin override; the engine default when `None`.
    pub base_url: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: Some("impersonate".to_string()),
            base_url: None,
        }
    }
}

/// Names accepted by [`create_search_engine`].
pub const ENGINE_NAMES: &[&str] = &["google", "duckduckgo"];

/// Create a search engine by name.
pub fn create_search_engine(
    name: &str,
    options: &EngineOptions,
) -> Result<Arc<dyn SearchEngine>, SearchError> {
    let client = build_client(options.timeout, options.user_agent.as_deref())?;
    let base_url = options.base_url.as_deref();
    match name.to_lowercase().as_str() {
        "google" => Ok(Arc::new(match base_url {
            Some(url) => GoogleEngine::with_base_url(client, url),
            None => GoogleEngine::new(client),
        })),
        "duckduckgo" | "ddg" => Ok(Arc::new(match base_url {
            Some(url) => DuckDuckGoEngine::with_base_url(client, url),
            None => DuckDuckGoEngine::new(client),
        })),
        _ => Err(SearchError::Config(format!(
            "Unknown search engine: {}. Available: {}",
            name,
            ENGINE_NAMES.join(", ")
        ))),
    }
}
