//! Request resolution.
//!
//! One pass per request: intent → cache key → lookup → dispatch → detached
//! cache write → envelope. Failures at any stage become a plain-text envelope
//! carrying the error's status; nothing is retried.

mod fetch;
mod search;

use scout_core::{Error, Intent, RequestParams, cache_key};

use crate::envelope::{Envelope, HTML_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::handler::AppState;

/// Resolve one request into the envelope sent downstream.
pub async fn resolve(state: &AppState, params: &RequestParams) -> Envelope {
    match resolve_intent(state, params).await {
        Ok(envelope) => envelope,
        Err(err) => {
            if err.status_code() >= 500 {
                tracing::error!("request failed: {}", err);
            } else {
                tracing::warn!("request failed: {}", err);
            }
            Envelope::from_error(&err)
        }
    }
}

async fn resolve_intent(state: &AppState, params: &RequestParams) -> Result<Envelope, Error> {
    let intent = Intent::parse(params, state.config.combined_search)?;
    tracing::info!("processing {}", intent.describe());

    let key = cache_key(&intent);
    if let Some(cached) = state.cache.lookup(&key).await? {
        return Ok(Envelope::ok(cached, cached_content_type(&intent)));
    }

    let (body, content_type) = match &intent {
        Intent::Search(search) => search::run(state, search).await?,
        Intent::Fetch(fetch) => fetch::run(state, fetch).await?,
    };

    state.cache.store(key, body.clone());
    Ok(Envelope::ok(body, content_type))
}

/// Only the body is cached, so hits are typed by intent.
fn cached_content_type(intent: &Intent) -> &'static str {
    if intent.is_search() { JSON_CONTENT_TYPE } else { HTML_CONTENT_TYPE }
}
