use std::sync::Arc;

use crate::jobs::JobService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Cached fetch + rank pipeline.
    pub jobs: Arc<JobService>,
}
