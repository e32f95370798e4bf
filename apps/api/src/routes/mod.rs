pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::batch::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Batch API
        .route("/api/v1/batches", post(handlers::handle_parse_batch))
        .route("/api/v1/batches/csv", post(handlers::handle_export_csv))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
