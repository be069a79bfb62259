//! Upstream HTTP transport.
//!
//! Both fetchers talk to the network through the `Transport` trait so the
//! resolver can be exercised against fakes. The production implementation
//! never follows redirects and caps the body size.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, Url};

use scout_core::Error;

use super::FetchConfig;

/// A GET request to an upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    pub headers: HeaderMap,
}

impl UpstreamRequest {
    pub fn new(url: Url) -> Self {
        Self { url, headers: HeaderMap::new() }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Host (and path) of the target, safe to log: the query may carry credentials.
    pub fn redacted_target(&self) -> String {
        format!("{}{}", self.url.host_str().unwrap_or(""), self.url.path())
    }
}

/// A fully read upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Header value as a string, if present and printable.
    pub fn header_str(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Canonical reason phrase for the status ("Not Found", ...).
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }
}

/// Async HTTP client seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET and read the whole body. Redirects are returned, not followed.
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, Error>;
}

/// Run one upstream call under a hard deadline.
///
/// An elapsed deadline drops the in-flight call and becomes
/// `Error::FetchTimeout`; there is no retry.
pub async fn send_with_timeout(
    transport: &dyn Transport, request: UpstreamRequest, timeout: Duration,
) -> Result<UpstreamResponse, Error> {
    let target = request.redacted_target();
    with_deadline(&target, timeout, transport.get(request)).await
}

/// Bound any upstream-facing future by `timeout`; `target` is only for messages.
pub async fn with_deadline<T>(
    target: &str, timeout: Duration, work: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match tokio::time::timeout(timeout, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("upstream {} timed out after {}ms", target, timeout.as_millis());
            Err(Error::FetchTimeout(format!(
                "Upstream request to {} timed out after {}ms",
                target,
                timeout.as_millis()
            )))
        }
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http: Client,
    max_bytes: usize,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, max_bytes: config.max_bytes })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, Error> {
        let target = request.redacted_target();

        let response = self
            .http
            .get(request.url)
            .headers(request.headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("Upstream request to {} timed out", target))
                } else {
                    Error::Network(format!("Failed to reach {}: {}", target, e.without_url()))
                }
            })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "Upstream response of {} bytes exceeds {}",
                len, self.max_bytes
            )));
        }

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response from {}: {}", target, e.without_url())))?;

        if body.len() > self.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "Upstream response of {} bytes exceeds {}",
                body.len(),
                self.max_bytes
            )));
        }

        tracing::debug!(
            "fetched {} -> {} ({} bytes, {})",
            target,
            status.as_u16(),
            body.len(),
            headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("no content-type")
        );

        Ok(UpstreamResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, Reply};

    #[test]
    fn test_redacted_target_drops_query() {
        let request = UpstreamRequest::new(Url::parse("https://api.example.com/v1?key=secret&q=x").unwrap());
        assert_eq!(request.redacted_target(), "api.example.com/v1");
    }

    #[test]
    fn test_response_helpers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_static("https://example.com/next"));
        let response =
            UpstreamResponse { status: StatusCode::NOT_FOUND, headers, body: Bytes::from_static(b"missing \xff") };

        assert_eq!(response.header_str(header::LOCATION), Some("https://example.com/next"));
        assert_eq!(response.reason(), "Not Found");
        assert!(response.text().starts_with("missing "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_fetch_timeout() {
        let transport = FakeTransport::new().route("example.com", Reply::Hang);
        let request = UpstreamRequest::new(Url::parse("https://example.com/").unwrap());

        let err = send_with_timeout(&transport, request, Duration::from_millis(5000)).await.unwrap_err();
        assert!(matches!(err, Error::FetchTimeout(_)));
        assert_eq!(err.status_code(), 504);
    }

    #[tokio::test]
    async fn test_fast_response_passes_through() {
        let transport = FakeTransport::new().route("example.com", Reply::ok("hello"));
        let request = UpstreamRequest::new(Url::parse("https://example.com/").unwrap());

        let response = send_with_timeout(&transport, request, Duration::from_millis(5000)).await.unwrap();
        assert_eq!(response.text(), "hello");
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_http_transport_new() {
        assert!(HttpTransport::new(&FetchConfig::default()).is_ok());
    }
}
