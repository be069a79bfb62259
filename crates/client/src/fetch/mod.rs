//! Raw page fetch pipeline.
//!
//! ### Target validation
//! - Trim whitespace, require an absolute `https` URL
//! - Drop fragments, preserve query string
//!
//! ### Safety gates
//! - Deny private ranges (RFC1918, link-local, localhost, etc.) when enabled
//! - Redirects are never followed: interstitials become 403, anything else 302
//! - Max body bytes: 5MB (configurable)
//!
//! ### Sanitization
//! - Targets matching a configured pattern get scripts, meta refreshes and
//!   forms stripped before they are returned or cached.

pub mod sanitize;
pub mod ssrf;
pub mod transport;
pub mod url;

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderValue};

pub use sanitize::{matches_any, strip_active_content};
pub use ssrf::{HostResolver, SsrfError, SystemResolver, guard_target, validate_ip};
pub use transport::{
    HttpTransport, Transport, UpstreamRequest, UpstreamResponse, send_with_timeout, with_deadline,
};
pub use self::url::{UrlError, parse_target};

use scout_core::{AppConfig, Error};

/// Content type used when the upstream does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const INTERSTITIAL_MESSAGE: &str =
    "Upstream detected an automated request (CAPTCHA interstitial). Try ?q= for search or a different URL.";

/// Configuration for the page fetcher and its transport.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Browser-like user agent sent upstream
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Hard deadline per upstream call (default: 5s)
    pub timeout: Duration,

    /// Refuse targets resolving to private or reserved addresses (default: true)
    pub block_private_targets: bool,

    /// Redirect targets treated as CAPTCHA interstitials
    pub interstitial_patterns: Vec<String>,

    /// Targets whose bodies get active content stripped
    pub sanitize_patterns: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            block_private_targets: config.block_private_targets,
            interstitial_patterns: config.interstitial_patterns.clone(),
            sanitize_patterns: config.sanitize_patterns.clone(),
        }
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The validated target
    pub url: ::url::Url,
    /// Body text, sanitized when the target matched
    pub content: String,
    /// Upstream content type or [`DEFAULT_CONTENT_TYPE`]
    pub content_type: String,
    /// Whether active content was stripped
    pub sanitized: bool,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Fetches arbitrary HTTPS pages with browser identity headers.
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn HostResolver>,
    config: FetchConfig,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: FetchConfig) -> Self {
        Self { transport, resolver: Arc::new(SystemResolver), config }
    }

    /// Swap the resolver used by the private-address guard.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Fetch `target` without following redirects.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` for unparseable or non-HTTPS targets
    /// - `SsrfBlocked` when the host resolves to a private address
    /// - `RedirectBlocked` / `RedirectPending` for 3xx answers
    /// - `Upstream` for any other non-2xx, carrying the upstream status
    /// - `FetchTimeout` when resolution and the request together exceed the
    ///   deadline
    /// - `FetchTooLarge`, `Network` from the transport
    pub async fn fetch(&self, target: &str) -> Result<FetchedPage, Error> {
        let start = Instant::now();
        let url = parse_target(target)?;
        let request = self.browser_request(url.clone())?;
        let redacted = request.redacted_target();
        let response = with_deadline(&redacted, self.config.timeout, self.guarded_get(&url, request)).await?;

        if response.status.is_redirection() {
            return Err(self.redirect_error(&url, &response));
        }

        if !response.status.is_success() {
            tracing::warn!("fetch failed: {} {} for {}", response.status.as_u16(), response.reason(), url);
            return Err(Error::Upstream {
                status: response.status.as_u16(),
                message: format!("Failed to fetch {}: {}", url, response.reason()),
            });
        }

        let mut content = response.text();
        let sanitized = matches_any(url.as_str(), &self.config.sanitize_patterns);
        if sanitized {
            content = strip_active_content(&content);
            tracing::debug!("stripped scripts, meta refreshes and forms from {}", url);
        }

        let content_type = response
            .header_str(header::CONTENT_TYPE)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("fetched {} in {}ms ({} bytes)", url, fetch_ms, content.len());

        Ok(FetchedPage { url, content, content_type, sanitized, fetch_ms })
    }

    async fn guarded_get(&self, url: &::url::Url, request: UpstreamRequest) -> Result<UpstreamResponse, Error> {
        if self.config.block_private_targets {
            guard_target(url, self.resolver.as_ref()).await?;
        }
        self.transport.get(request).await
    }

    fn browser_request(&self, url: ::url::Url) -> Result<UpstreamRequest, Error> {
        let user_agent = HeaderValue::from_str(&self.config.user_agent)
            .map_err(|e| Error::Configuration(format!("invalid user agent: {}", e)))?;

        Ok(UpstreamRequest::new(url)
            .header(header::USER_AGENT, user_agent)
            .header(header::ACCEPT, HeaderValue::from_static(ACCEPT))
            .header(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE))
            .header(header::DNT, HeaderValue::from_static("1"))
            .header(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1")))
    }

    fn redirect_error(&self, url: &::url::Url, response: &UpstreamResponse) -> Error {
        let Some(location) = response.header_str(header::LOCATION).filter(|l| !l.is_empty()) else {
            return Error::Network(format!(
                "Failed to fetch {}: {} redirect without a Location header",
                url,
                response.status.as_u16()
            ));
        };

        tracing::info!("{} redirected to {}", url, location);

        if matches_any(location, &self.config.interstitial_patterns) {
            Error::RedirectBlocked(INTERSTITIAL_MESSAGE.to_string())
        } else {
            Error::RedirectPending { location: location.to_string() }
        }
    }
}
