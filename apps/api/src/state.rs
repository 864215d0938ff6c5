use std::sync::Arc;

use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::llm_client::ModelGateway;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds only immutable collaborators; every request owns its own pipeline data.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ModelGateway>,
    pub extractor: Arc<dyn TextExtractor>,
    pub config: Config,
}
