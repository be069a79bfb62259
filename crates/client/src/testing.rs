//! Scripted transport for tests, shared with downstream crates through the
//! `test-util` feature.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scout_core::Error;
use tokio::sync::Barrier;

use crate::fetch::{Transport, UpstreamRequest, UpstreamResponse};

/// Canned upstream behaviour.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond { status: u16, headers: Vec<(&'static str, String)>, body: String },
    Hang,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Respond { status: 200, headers: Vec::new(), body: body.to_string() }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Respond { status, headers: Vec::new(), body: body.to_string() }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Reply::Respond { status, headers: vec![("location", location.to_string())], body: String::new() }
    }

    pub fn with_header(self, name: &'static str, value: &str) -> Self {
        match self {
            Reply::Respond { status, mut headers, body } => {
                headers.push((name, value.to_string()));
                Reply::Respond { status, headers, body }
            }
            Reply::Hang => Reply::Hang,
        }
    }
}

/// Transport that answers from the first route whose pattern occurs in the URL.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<(String, Reply)>,
    barrier: Option<Arc<Barrier>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, pattern: &str, reply: Reply) -> Self {
        self.routes.push((pattern.to_string(), reply));
        self
    }

    /// Every call waits here before replying.
    #[must_use]
    pub fn rendezvous(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.url.to_string()).collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        let reply = self
            .routes
            .iter()
            .find(|(pattern, _)| request.url.as_str().contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| Error::Network(format!("no route for {}", request.url)))?;

        match reply {
            Reply::Hang => std::future::pending::<Result<UpstreamResponse, Error>>().await,
            Reply::Respond { status, headers, body } => {
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    map.insert(HeaderName::from_static(name), HeaderValue::from_str(&value).unwrap());
                }
                Ok(UpstreamResponse {
                    status: StatusCode::from_u16(status).unwrap(),
                    headers: map,
                    body: Bytes::from(body),
                })
            }
        }
    }
}
