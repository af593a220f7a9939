//! Shared key-value store used by both peers of a room

use std::future::Future;
use std::time::Duration;

pub mod activity;
pub mod http;
pub mod memory;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog};
pub use http::HttpStore;
pub use memory::MemoryStore;

/// Minimal string key-value store with last-write-wins semantics.
///
/// Both peers of a room must talk to the same store. Implementations are
/// cheap to clone and share one backing map or connection pool.
pub trait KvStore: Clone + Send + Sync + 'static {
    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Write a value, replacing whatever was there
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove a key. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store did not answer within {0:?}")]
    Timeout(Duration),
}
