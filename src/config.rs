//! Configuration management for phishscope using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::extraction::DEFAULT_MAX_HTML_BYTES;
use crate::keywords::DEFAULT_MAX_KEYWORDS;

/// Default search engine.
pub const DEFAULT_SEARCH_ENGINE: &str = "google";

/// Subdirectory of the data directory holding site records.
pub const RECORDS_SUBDIR: &str = "records";

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Keywords per search query.
    pub max_keywords: usize,
    /// Search engine name ("google" or "duckduckgo").
    pub search_engine: String,
    /// Override for the engine's base URL.
    pub search_base_url: Option<String>,
    /// User agent for HTTP requests. "impersonate" picks a browser UA.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Retries after a failed search.
    pub search_retries: u32,
    /// Initial retry backoff in milliseconds, doubled per attempt.
    pub retry_backoff_ms: u64,
    /// Delay before every search in milliseconds.
    pub search_delay_ms: u64,
    /// Public suffix list file; the embedded list is used when unset.
    pub public_suffix_list: Option<PathBuf>,
    /// Directory of `<lang>.txt` stopword lists overriding the embedded ones.
    pub stopwords_dir: Option<PathBuf>,
    pub ocr_enabled: bool,
    /// Fixed Tesseract language code; unset follows the page language.
    pub ocr_language: Option<String>,
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Additional registrable-domain labels treated as noise.
    pub extra_noise_domains: Vec<String>,
    /// HTML sources larger than this are skipped.
    pub max_html_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        // Platform data dir -> Home dir -> Current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("phishscope");

        Self {
            max_keywords: DEFAULT_MAX_KEYWORDS,
            search_engine: DEFAULT_SEARCH_ENGINE.to_string(),
            search_base_url: None,
            user_agent: Some("impersonate".to_string()),
            request_timeout: 10,
            search_retries: 2,
            retry_backoff_ms: 500,
            search_delay_ms: 0,
            public_suffix_list: None,
            stopwords_dir: None,
            ocr_enabled: true,
            ocr_language: None,
            data_dir,
            extra_noise_domains: Vec::new(),
            max_html_bytes: DEFAULT_MAX_HTML_BYTES,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Directory of the site-record store.
    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join(RECORDS_SUBDIR)
    }

    /// Apply `PHISHSCOPE_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        if let Some(engine) = get("PHISHSCOPE_SEARCH_ENGINE") {
            tracing::debug!("Using PHISHSCOPE_SEARCH_ENGINE from environment: {}", engine);
            self.search_engine = engine;
        }
        if let Some(dir) = get("PHISHSCOPE_DATA_DIR") {
            tracing::debug!("Using PHISHSCOPE_DATA_DIR from environment: {}", dir);
            self.data_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
        if let Some(raw) = get("PHISHSCOPE_MAX_KEYWORDS") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.max_keywords = n,
                _ => tracing::warn!("Ignoring invalid PHISHSCOPE_MAX_KEYWORDS: {}", raw),
            }
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_keywords: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_base_url: Option<String>,
    /// User agent string, or "impersonate".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_retries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_backoff_ms: Option<u64>,
    /// Delay before every search in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_suffix_list: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[prefer(default)]
    pub extra_noise_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_html_bytes: Option<u64>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers phishscope config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("phishscope").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved against `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(max) = self.max_keywords.filter(|n| *n > 0) {
            settings.max_keywords = max as usize;
        }
        if let Some(ref engine) = self.search_engine {
            settings.search_engine = engine.clone();
        }
        if let Some(ref base_url) = self.search_base_url {
            settings.search_base_url = Some(base_url.clone());
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(retries) = self.search_retries {
            settings.search_retries = retries.min(u32::MAX as u64) as u32;
        }
        if let Some(backoff) = self.retry_backoff_ms {
            settings.retry_backoff_ms = backoff;
        }
        if let Some(delay) = self.search_delay_ms {
            settings.search_delay_ms = delay;
        }
        if let Some(ref psl) = self.public_suffix_list {
            settings.public_suffix_list = Some(self.resolve_path(psl, base_dir));
        }
        if let Some(ref dir) = self.stopwords_dir {
            settings.stopwords_dir = Some(self.resolve_path(dir, base_dir));
        }
        if let Some(enabled) = self.ocr_enabled {
            settings.ocr_enabled = enabled;
        }
        if let Some(ref language) = self.ocr_language {
            settings.ocr_language = Some(language.clone());
        }
        settings
            .extra_noise_domains
            .extend(self.extra_noise_domains.iter().cloned());
        if let Some(max) = self.max_html_bytes {
            settings.max_html_bytes = max as usize;
        }
    }
}

/// Load settings from an explicit config file, or by discovery.
/// Returns (Settings, Config) tuple.
pub async fn load_settings(config_path: Option<&Path>) -> (Settings, Config) {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await.unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Config::default()
        }),
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env_overrides();

    (settings, config)
}
