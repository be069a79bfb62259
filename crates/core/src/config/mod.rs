//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SCOUT_*)
//! 2. TOML config file (if SCOUT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Spoofed browser identity sent with every upstream request.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SCOUT_*)
/// 2. TOML config file (if SCOUT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Google Custom Search API key.
    ///
    /// Set via SCOUT_GOOGLE_API_KEY environment variable.
    /// Required only when a search request misses the cache.
    #[serde(default)]
    pub google_api_key: Option<String>,

    /// Custom Search engine id (`cx`).
    #[serde(default = "default_search_engine_id")]
    pub search_engine_id: String,

    /// Custom Search JSON API endpoint.
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,

    /// Run every search in combined (web + image) mode, ignoring `searchType`.
    ///
    /// Set via SCOUT_COMBINED_SEARCH environment variable.
    #[serde(default)]
    pub combined_search: bool,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SCOUT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Expiration written with every cache entry, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,

    /// User-Agent string for upstream requests.
    ///
    /// Set via SCOUT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read per upstream response.
    ///
    /// Set via SCOUT_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via SCOUT_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Refuse `url` targets that resolve to private or reserved addresses.
    #[serde(default = "default_true")]
    pub block_private_targets: bool,

    /// Redirect targets treated as CAPTCHA interstitials.
    #[serde(default = "default_interstitial_patterns")]
    pub interstitial_patterns: Vec<String>,

    /// Target URL fragments whose pages get scripts, refreshes and forms stripped.
    #[serde(default = "default_sanitize_patterns")]
    pub sanitize_patterns: Vec<String>,
}

fn default_search_engine_id() -> String {
    "400138774a1b94845".into()
}

fn default_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".into()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8787".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./scout-cache.sqlite")
}

fn default_cache_ttl_secs() -> i64 {
    86_400
}

fn default_user_agent() -> String {
    BROWSER_USER_AGENT.into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_interstitial_patterns() -> Vec<String> {
    vec!["google.com/sorry/index".into()]
}

fn default_sanitize_patterns() -> Vec<String> {
    vec!["google.com/search".into()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            search_engine_id: default_search_engine_id(),
            search_base_url: default_search_base_url(),
            combined_search: false,
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            block_private_targets: true,
            interstitial_patterns: default_interstitial_patterns(),
            sanitize_patterns: default_sanitize_patterns(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SCOUT_`
    /// 2. TOML file from `SCOUT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SCOUT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SCOUT_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the search API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is unset or blank.
    pub fn require_google_api_key(&self) -> Result<&str, ConfigError> {
        self.google_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "google_api_key".into(),
                hint: "Set SCOUT_GOOGLE_API_KEY environment variable".into(),
            })
    }
}
