//! Application state for latency service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::service::{QueryProbe, QueryProbeTrait};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub probe: Arc<dyn QueryProbeTrait>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            probe: Arc::new(QueryProbe::new(config.database.clone())),
            config,
        }
    }

    /// Creates a state backed by a caller-provided probe (used by tests).
    pub fn with_probe(config: AppConfig, probe: Arc<dyn QueryProbeTrait>) -> Self {
        Self { config, probe }
    }
}
