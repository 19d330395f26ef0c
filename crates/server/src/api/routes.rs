use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{artifacts, batch, convert, detect, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.config().server.max_upload_bytes;

    // API routes
    let api_routes = Router::new()
        // Health, config and observability
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        .route("/formats", get(handlers::list_formats))
        .route("/pool", get(handlers::pool_status))
        // Conversion
        .route("/detect", post(detect::detect_format))
        .route("/convert", post(convert::convert_file))
        .route("/batch", post(batch::run_batch))
        .route("/batch/stream", post(batch::stream_batch))
        // Downloads
        .route(
            "/artifacts/{handle}",
            get(artifacts::download_artifact).delete(artifacts::delete_artifact),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
