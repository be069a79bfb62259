//! Core types and shared functionality for scout.
//!
//! This crate provides:
//! - Request intent parsing and cache key derivation
//! - Key-value cache with SQLite backend and the response cache facade
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod intent;

pub use cache::{CacheDb, KvStore, ResponseCache, cache_key};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use intent::{FetchIntent, Intent, RequestParams, SearchIntent, SearchMode};
