//! HTTP handler and router.
//!
//! Every method and path lands on the same handler; only the query string
//! matters.

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use scout_client::{FetchConfig, PageFetcher, Transport};
use scout_core::{AppConfig, Error, KvStore, RequestParams, ResponseCache};

use crate::envelope::Envelope;
use crate::resolver;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: ResponseCache,
    pub transport: Arc<dyn Transport>,
    pub fetcher: PageFetcher,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn KvStore>, transport: Arc<dyn Transport>) -> Self {
        let cache = ResponseCache::new(store, config.cache_ttl_secs);
        let fetcher = PageFetcher::new(Arc::clone(&transport), FetchConfig::from(&config));
        Self { config: Arc::new(config), cache, transport, fetcher }
    }
}

/// Build the router with tracing and the panic safety net.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(handle)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}

async fn handle(State(state): State<AppState>, query: Result<Query<RequestParams>, QueryRejection>) -> Envelope {
    match query {
        Ok(Query(params)) => resolver::resolve(&state, &params).await,
        Err(rejection) => {
            tracing::warn!("rejected query string: {}", rejection.body_text());
            Envelope::from_error(&Error::InvalidInput(format!("Malformed query string: {}", rejection.body_text())))
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!("handler panicked: {}", detail);
    Envelope::plain(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {detail}")).into_response()
}
