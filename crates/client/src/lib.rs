//! Upstream clients for scout.
//!
//! This crate provides the raw page fetch pipeline, the Custom Search client,
//! and the transport seam both of them share.

pub mod fetch;
pub mod google;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use fetch::{
    FetchConfig, FetchedPage, HttpTransport, PageFetcher, Transport, UpstreamRequest, UpstreamResponse,
    strip_active_content,
};
pub use google::{MAX_RESULTS, ResultKind, ResultRecord, SearchClient, SearchConfig, render_records};
