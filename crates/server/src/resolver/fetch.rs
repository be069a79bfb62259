//! Fetch intent dispatch.

use scout_core::{Error, FetchIntent};

use crate::handler::AppState;

pub async fn run(state: &AppState, intent: &FetchIntent) -> Result<(String, String), Error> {
    let page = state.fetcher.fetch(&intent.target_url).await?;

    tracing::info!("fetched {} in {}ms (sanitized: {})", page.url, page.fetch_ms, page.sanitized);

    Ok((page.content, page.content_type))
}
