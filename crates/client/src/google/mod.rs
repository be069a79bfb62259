//! Google Custom Search JSON API client.
//!
//! ### Behaviour
//!
//! - **Endpoint**: `https://www.googleapis.com/customsearch/v1`
//! - **Authentication**: `key` query parameter, engine selected with `cx`.
//! - **Modes**: `web` (one call), `image` (one call with `searchType=image`),
//!   `combined` (both calls at once, image results first, each tagged).
//! - **Limits**: at most five records per call; no retries; every call runs
//!   under the configured deadline.

pub mod response;

pub use response::{CseApiResponse, CseItem, ResultKind, ResultRecord, render_records};

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderValue};
use url::Url;

use scout_core::{AppConfig, Error, SearchMode};

use crate::fetch::{Transport, UpstreamRequest, send_with_timeout};

/// Records kept per upstream call.
pub const MAX_RESULTS: usize = 5;

/// Search client configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// API key from SCOUT_GOOGLE_API_KEY.
    pub api_key: String,
    /// Programmable search engine id (`cx`).
    pub engine_id: String,
    /// Endpoint URL (default: https://www.googleapis.com/customsearch/v1).
    pub base_url: String,
    /// Deadline per upstream call (default: 5s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl From<&AppConfig> for SearchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_key: config.google_api_key.clone().unwrap_or_default(),
            engine_id: config.search_engine_id.clone(),
            base_url: config.search_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Custom Search client over a [`Transport`].
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    config: SearchConfig,
    endpoint: Url,
}

impl SearchClient {
    /// Create a client, refusing to start without a credential.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the API key is blank or the endpoint
    /// does not parse.
    pub fn new(config: SearchConfig, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Configuration("Search API key not configured".into()));
        }

        let endpoint = Url::parse(&config.base_url)
            .map_err(|e| Error::Configuration(format!("invalid search endpoint {}: {}", config.base_url, e)))?;

        Ok(Self { transport, config, endpoint })
    }

    /// Run a search and return the records to emit.
    ///
    /// In combined mode both legs are in flight together; the first failure
    /// cancels the other and fails the whole search.
    pub async fn search(&self, query: &str, mode: SearchMode, entry_id: i64) -> Result<Vec<ResultRecord>, Error> {
        let start = Instant::now();
        tracing::debug!("searching: query={} mode={}", query, mode.as_str());

        let records = match mode {
            SearchMode::Web => self.leg(query, ResultKind::Web, entry_id, false).await?,
            SearchMode::Image => self.leg(query, ResultKind::Image, entry_id, false).await?,
            SearchMode::Combined => {
                let (mut images, web) = tokio::try_join!(
                    self.leg(query, ResultKind::Image, entry_id, true),
                    self.leg(query, ResultKind::Web, entry_id, true),
                )?;
                images.extend(web);
                images
            }
        };

        tracing::debug!("search completed in {:?}, {} records", start.elapsed(), records.len());
        Ok(records)
    }

    async fn leg(&self, query: &str, kind: ResultKind, entry_id: i64, tagged: bool) -> Result<Vec<ResultRecord>, Error> {
        let request = self.request(query, kind)?;
        let response = send_with_timeout(self.transport.as_ref(), request, self.config.timeout).await?;

        if !response.status.is_success() {
            let body = response.text();
            tracing::warn!("search API failed: {} {} - {}", response.status.as_u16(), response.reason(), body);
            return Err(Error::Upstream {
                status: response.status.as_u16(),
                message: format!("Failed to fetch search results: {} - {}", response.reason(), body),
            });
        }

        let api_response: CseApiResponse = serde_json::from_slice(&response.body)
            .map_err(|e| Error::Parse(format!("Failed to parse search results: {}", e)))?;

        Ok(api_response.into_records(entry_id, tagged.then_some(kind), MAX_RESULTS))
    }

    fn request(&self, query: &str, kind: ResultKind) -> Result<UpstreamRequest, Error> {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.config.api_key);
            pairs.append_pair("cx", &self.config.engine_id);
            pairs.append_pair("q", query);
            if kind == ResultKind::Image {
                pairs.append_pair("searchType", "image");
            }
        }

        let user_agent = HeaderValue::from_str(&self.config.user_agent)
            .map_err(|e| Error::Configuration(format!("invalid user agent: {}", e)))?;

        Ok(UpstreamRequest::new(url)
            .header(header::USER_AGENT, user_agent)
            .header(header::ACCEPT, HeaderValue::from_static("application/json")))
    }
}
