//! Application state for the web server.

use std::sync::Arc;

use sieve::{Pipeline, PipelineConfig, TextGenerator};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Generator shared by every request.
    pub generator: Arc<dyn TextGenerator>,
    /// Pipeline settings applied to every request.
    pub config: PipelineConfig,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>, config: PipelineConfig) -> Self {
        Self { generator, config }
    }

    /// Build a pipeline for one request.
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::from_shared(Arc::clone(&self.generator)).with_config(self.config.clone())
    }
}
