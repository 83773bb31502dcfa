pub mod health;
pub mod jobs;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/jobs", get(jobs::handle_list_jobs))
        .route("/api/jobs/refresh", post(jobs::handle_refresh))
        .route("/api/jobs/search", get(jobs::handle_search))
        .route("/api/filters", get(jobs::handle_filters))
        .fallback(not_found)
        .with_state(state)
}
