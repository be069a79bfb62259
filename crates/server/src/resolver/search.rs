//! Search intent dispatch.

use std::sync::Arc;

use scout_client::{SearchClient, SearchConfig, render_records};
use scout_core::{Error, SearchIntent};

use crate::envelope::JSON_CONTENT_TYPE;
use crate::handler::AppState;

/// Run the search and render the records to emit.
///
/// The credential is checked per request: a missing key fails here, before
/// any upstream call, and nothing reaches the cache.
pub async fn run(state: &AppState, intent: &SearchIntent) -> Result<(String, String), Error> {
    let client = SearchClient::new(SearchConfig::from(state.config.as_ref()), Arc::clone(&state.transport))?;
    let records = client.search(&intent.query, intent.mode, intent.entry_id).await?;

    tracing::info!("search {} ({}) returned {} records", intent.query, intent.mode.as_str(), records.len());
    Ok((render_records(&records)?, JSON_CONTENT_TYPE.to_string()))
}
