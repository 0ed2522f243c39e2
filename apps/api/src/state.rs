use std::sync::Arc;

use crate::config::Config;
use crate::interview::pipeline::InterviewPipeline;
use crate::meeting::CallProvider;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single session scope. The pipeline holds a handle to the same store.
    pub session: SessionStore,
    pub pipeline: InterviewPipeline,
    /// Pluggable call backend. Default: InstantCallProvider.
    pub calls: Arc<dyn CallProvider>,
    pub config: Config,
}
