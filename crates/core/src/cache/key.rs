//! Cache key derivation.
//!
//! Keys keep the `search:{query}:{mode}:{entryId}` / `cache:{url}` layout.
//! The query is the only free-text field inside a delimited key, so `%` and
//! `:` in it are percent-escaped; a plain query yields the bare layout.

use crate::intent::{FetchIntent, Intent, SearchIntent};

/// Compute the cache key for a request intent.
pub fn cache_key(intent: &Intent) -> String {
    match intent {
        Intent::Search(search) => search_key(search),
        Intent::Fetch(fetch) => fetch_key(fetch),
    }
}

fn search_key(intent: &SearchIntent) -> String {
    format!("search:{}:{}:{}", escape_segment(&intent.query), intent.mode.as_str(), intent.entry_id)
}

fn fetch_key(intent: &FetchIntent) -> String {
    format!("cache:{}", intent.target_url)
}

fn escape_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            other => out.push(other),
        }
    }
    out
}
