//! Target URL validation.

use scout_core::Error;

/// Error type for target URL validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        match err {
            UrlError::Empty | UrlError::InvalidUrl(_) => Error::InvalidUrl("Invalid URL".into()),
            UrlError::UnsupportedScheme(_) => Error::InvalidUrl("Only HTTPS URLs supported".into()),
        }
    }
}

/// Parse a fetch target and require HTTPS.
///
/// The input is trimmed and must be absolute; no default scheme is added.
/// Fragments are dropped since they never reach the upstream.
pub fn parse_target(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if parsed.scheme() != "https" {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::InvalidUrl("missing host".into()));
    }

    parsed.set_fragment(None);

    Ok(parsed)
}
