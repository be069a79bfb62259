//! Request intent parsing.
//!
//! Turns raw query-string parameters into exactly one of a search or a
//! fetch intent. Empty parameters count as absent.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Guidance returned when neither `q` nor `url` is supplied.
pub const MISSING_PARAMS_MESSAGE: &str =
    "Missing 'q' or 'url' query parameter. Example: ?q=test or ?url=https://example.com";

/// Raw query-string parameters accepted by the proxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestParams {
    /// Search query.
    #[serde(default)]
    pub q: Option<String>,

    /// `image`, `combined`, anything else or absent (web).
    #[serde(default, rename = "searchType")]
    pub search_type: Option<String>,

    /// Arbitrary HTTPS target.
    #[serde(default)]
    pub url: Option<String>,

    /// Integer tag attached to every result record (default 1).
    #[serde(default, rename = "entryId")]
    pub entry_id: Option<String>,
}

/// Which upstream search calls a search intent makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Web,
    Image,
    Combined,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Web => "web",
            SearchMode::Image => "image",
            SearchMode::Combined => "combined",
        }
    }

    /// Unrecognised values fall back to a web search.
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("image") => SearchMode::Image,
            Some("combined") => SearchMode::Combined,
            _ => SearchMode::Web,
        }
    }
}

/// A search request against the external search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIntent {
    pub query: String,
    pub mode: SearchMode,
    pub entry_id: i64,
}

/// A raw fetch of an arbitrary URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchIntent {
    /// Target exactly as supplied; validated by the page fetcher.
    pub target_url: String,
}

/// The parsed meaning of an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Search(SearchIntent),
    Fetch(FetchIntent),
}

impl Intent {
    /// Derive the intent from query parameters.
    ///
    /// `q` wins when both `q` and `url` are present. When `combined_variant`
    /// is set every search runs in combined mode and `searchType` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if both `q` and `url` are absent, or
    /// `entryId` is not an integer.
    pub fn parse(params: &RequestParams, combined_variant: bool) -> Result<Self, Error> {
        let query = non_empty(params.q.as_deref());
        let target = non_empty(params.url.as_deref());

        match (query, target) {
            (Some(query), _) => {
                let mode =
                    if combined_variant { SearchMode::Combined } else { SearchMode::parse(params.search_type.as_deref()) };
                let entry_id = parse_entry_id(params.entry_id.as_deref())?;
                Ok(Intent::Search(SearchIntent { query: query.to_string(), mode, entry_id }))
            }
            (None, Some(target)) => Ok(Intent::Fetch(FetchIntent { target_url: target.to_string() })),
            (None, None) => Err(Error::InvalidInput(MISSING_PARAMS_MESSAGE.to_string())),
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, Intent::Search(_))
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match self {
            Intent::Search(s) => format!("search query {} ({})", s.query, s.mode.as_str()),
            Intent::Fetch(f) => format!("URL {}", f.target_url),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn parse_entry_id(raw: Option<&str>) -> Result<i64, Error> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(1),
        Some(value) => value
            .parse()
            .map_err(|_| Error::InvalidInput(format!("Invalid 'entryId' value '{value}'. Expected an integer."))),
    }
}
