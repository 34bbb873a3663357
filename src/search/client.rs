//! Shared HTTP client construction for search engines and the site fetcher.

use std::time::Duration;

use reqwest::Client;

/// Identifies the tool when no browser impersonation is requested.
pub const USER_AGENT: &str = concat!("phishscope/", env!("CARGO_PKG_VERSION"));

/// Browser user agents used in impersonate mode. Search engines serve
/// degraded or blocked result pages to unknown agents.
pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

/// Pick a browser user agent, varying between runs.
pub fn browser_user_agent() -> &'static str {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as usize)
        .unwrap_or(0);
    BROWSER_USER_AGENTS[nanos % BROWSER_USER_AGENTS.len()]
}

/// Resolve the configured user agent.
/// - None => the phishscope agent
/// - "impersonate" => a real browser agent
/// - other => used verbatim
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None => USER_AGENT.to_string(),
        Some("impersonate") => browser_user_agent().to_string(),
        Some(custom) => custom.to_string(),
    }
}

/// Build a client with the resolved user agent, a request timeout,
/// compression and cookie support.
pub fn build_client(timeout: Duration, user_agent: Option<&str>) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(resolve_user_agent(user_agent))
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .cookie_store(true)
        .build()
}
