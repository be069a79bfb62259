//! Unified error types for scout.
//!
//! Every failure in the resolution pipeline becomes one of these variants at
//! the point of detection. Each variant knows the HTTP status it is emitted
//! with and the plain-text body the caller sees.

use tokio_rusqlite::rusqlite;

/// Unified error types for the scout proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed request parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Target URL is unparseable or not HTTPS.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Required configuration (e.g. the search credential) is absent.
    #[error("CONFIG_ERROR: {0}")]
    Configuration(String),

    /// SSRF blocked - private/internal address not allowed.
    #[error("SSRF_BLOCKED: {0}")]
    SsrfBlocked(String),

    /// Upstream redirected to a known CAPTCHA interstitial.
    #[error("REDIRECT_BLOCKED: {0}")]
    RedirectBlocked(String),

    /// Upstream redirected somewhere else; the caller must re-request it.
    #[error("REDIRECT_PENDING: {location}")]
    RedirectPending { location: String },

    /// Upstream answered with a non-2xx status.
    #[error("HTTP_ERROR: {status} {message}")]
    Upstream { status: u16, message: String },

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Connection, TLS or body read failure.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Upstream body could not be decoded.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Cache schema could not be brought up to date.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A non-SQLite key-value backend failed.
    #[error("CACHE_ERROR: {0}")]
    Store(String),
}

impl Error {
    /// HTTP status the error is emitted with.
    ///
    /// Upstream statuses are propagated as-is; anything that is not a valid
    /// error status falls back to 502.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) | Error::InvalidUrl(_) => 400,
            Error::SsrfBlocked(_) | Error::RedirectBlocked(_) => 403,
            Error::RedirectPending { .. } => 302,
            Error::Upstream { status, .. } if (400..=599).contains(status) => *status,
            Error::Upstream { .. } => 502,
            Error::FetchTimeout(_) => 504,
            Error::FetchTooLarge(_) | Error::Network(_) | Error::Parse(_) => 502,
            Error::Configuration(_) | Error::Database(_) | Error::MigrationFailed(_) | Error::Store(_) => 500,
        }
    }

    /// Plain-text body sent downstream.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidInput(msg)
            | Error::InvalidUrl(msg)
            | Error::Configuration(msg)
            | Error::RedirectBlocked(msg)
            | Error::FetchTimeout(msg)
            | Error::FetchTooLarge(msg)
            | Error::Network(msg)
            | Error::Parse(msg) => msg.clone(),
            Error::SsrfBlocked(msg) => format!("Target address not allowed: {msg}"),
            Error::RedirectPending { location } => format!("Redirected to {location}. Update the URL parameter."),
            Error::Upstream { message, .. } => message.clone(),
            Error::Database(_) | Error::MigrationFailed(_) | Error::Store(_) => format!("Error: {self}"),
        }
    }

}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidUrl("Invalid URL".to_string());
        assert!(err.to_string().contains("INVALID_URL"));
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(Error::InvalidUrl("x".into()).status_code(), 400);
        assert_eq!(Error::Configuration("x".into()).status_code(), 500);
        assert_eq!(Error::RedirectBlocked("x".into()).status_code(), 403);
        assert_eq!(Error::RedirectPending { location: "x".into() }.status_code(), 302);
        assert_eq!(Error::FetchTimeout("x".into()).status_code(), 504);
        assert_eq!(Error::Network("x".into()).status_code(), 502);
        assert_eq!(Error::MigrationFailed("x".into()).status_code(), 500);
    }

    #[test]
    fn test_upstream_status_propagates() {
        let err = Error::Upstream { status: 429, message: "slow down".into() };
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.public_message(), "slow down");
    }

    #[test]
    fn test_upstream_non_error_status_maps_to_bad_gateway() {
        let err = Error::Upstream { status: 204, message: "odd".into() };
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_redirect_pending_echoes_location() {
        let err = Error::RedirectPending { location: "https://example.com/next".into() };
        assert_eq!(err.public_message(), "Redirected to https://example.com/next. Update the URL parameter.");
    }

    #[test]
    fn test_internal_errors_are_prefixed() {
        let err = Error::MigrationFailed("boom".into());
        assert_eq!(err.public_message(), "Error: CACHE_ERROR: migration failed: boom");
    }
}
