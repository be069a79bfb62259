//! The response envelope.
//!
//! Everything the proxy sends downstream goes through [`Envelope`], which
//! fixes the header set regardless of outcome.

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use scout_core::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const PLAIN_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

static X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

/// Status, content type and body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub status: StatusCode,
    pub content_type: String,
    pub body: String,
}

impl Envelope {
    /// 200 with the given body.
    pub fn ok(body: String, content_type: impl Into<String>) -> Self {
        Self { status: StatusCode::OK, content_type: content_type.into(), body }
    }

    /// Plain-text body with an arbitrary status.
    pub fn plain(status: StatusCode, body: impl Into<String>) -> Self {
        Self { status, content_type: PLAIN_TEXT_CONTENT_TYPE.to_string(), body: body.into() }
    }

    /// Plain-text error using the status and message the error carries.
    pub fn from_error(err: &Error) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::plain(status, err.public_message())
    }
}

impl From<Error> for Envelope {
    fn from(err: Error) -> Self {
        Self::from_error(&err)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(PLAIN_TEXT_CONTENT_TYPE));

        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(X_ROBOTS_TAG.clone(), HeaderValue::from_static("noindex"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        response
    }
}
