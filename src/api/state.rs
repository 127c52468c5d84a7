//! Application state for the API server

use crate::{Config, ZipCollector};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The collector behind every task route
    pub collector: Arc<ZipCollector>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(collector: Arc<ZipCollector>, config: Arc<Config>) -> Self {
        Self { collector, config }
    }
}
