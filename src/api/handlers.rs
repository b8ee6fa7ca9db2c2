//! API Handlers
//!
//! HTTP request handlers for the readiness and maintenance endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::models::{HealthResponse, RemovedResponse};
use crate::provider::{CacheProvider, ProviderStats};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide cache provider
    pub provider: Arc<CacheProvider>,
}

impl AppState {
    /// Creates a new AppState around an existing provider.
    pub fn new(provider: Arc<CacheProvider>) -> Self {
        Self { provider }
    }

    /// Creates a new AppState with a fresh provider built from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(CacheProvider::new(config.clone())))
    }
}

/// Handler for GET /health
///
/// Responds 200 when the active tier answers its probe, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = state.provider.health_check().await;
    let status = if health.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let backend = state.provider.cache().cache_type();

    (status, Json(HealthResponse::new(backend, health)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<ProviderStats>> {
    let stats = state.provider.get_stats().await?;
    Ok(Json(stats))
}

/// Handler for POST /maintenance/flush-temporary
pub async fn flush_temporary_handler(
    State(state): State<AppState>,
) -> Result<Json<RemovedResponse>> {
    let removed = state.provider.manager().flush_temporary().await?;
    Ok(Json(RemovedResponse::new(removed)))
}

/// Handler for DELETE /users/:id/cache
pub async fn clear_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<RemovedResponse>> {
    let removed = state.provider.manager().clear_user_data(&user_id).await?;
    Ok(Json(RemovedResponse::new(removed)))
}

/// Handler for DELETE /factions/:id/cache
pub async fn clear_faction_handler(
    State(state): State<AppState>,
    Path(faction_id): Path<String>,
) -> Result<Json<RemovedResponse>> {
    let removed = state
        .provider
        .manager()
        .clear_faction_data(&faction_id)
        .await?;
    Ok(Json(RemovedResponse::new(removed)))
}
