//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::store::MemoryStore;
use crate::util::rate_limit::{create_limiter, Limiter};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Backing map of the shared room store
    pub store: MemoryStore,
    /// Request limiter for the store API
    pub limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let limiter = create_limiter(config.store_rate_limit);

        Self {
            config: Arc::new(config),
            store: MemoryStore::new(),
            limiter,
        }
    }
}
