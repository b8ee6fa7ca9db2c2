//! API Routes
//!
//! Configures the Axum router with the readiness and maintenance endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_faction_handler, clear_user_handler, flush_temporary_handler, health_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/maintenance/flush-temporary", post(flush_temporary_handler))
        .route("/users/:id/cache", delete(clear_user_handler))
        .route("/factions/:id/cache", delete(clear_faction_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
