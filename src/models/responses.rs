//! Response DTOs for the operational HTTP surface
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheType;
use crate::manager::HealthStatus;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the active tier answered its probe, else "unhealthy"
    pub status: String,
    /// Tier currently serving calls
    pub backend: CacheType,
    #[serde(flatten)]
    pub health: HealthStatus,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn new(backend: CacheType, health: HealthStatus) -> Self {
        let status = if health.connected { "healthy" } else { "unhealthy" };
        Self {
            status: status.to_string(),
            backend,
            health,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for bulk removal endpoints
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Number of keys removed
    pub removed: u64,
}

impl RemovedResponse {
    pub fn new(removed: u64) -> Self {
        Self { removed }
    }
}
