use std::sync::Arc;

use crate::engine::CacheEngine;

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CacheEngine>,
}

impl AppState {
    pub fn new(engine: Arc<CacheEngine>) -> Self {
        Self { engine }
    }
}
