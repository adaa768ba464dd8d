use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::config::CacheBackend;
use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Number of tenant schemas this instance routes to.
    pub tenants: usize,
    /// `memory` or `redis`.
    pub cache_backend: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match workshop_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let cache_backend = match state.config.cache.backend {
        CacheBackend::Memory => "memory",
        CacheBackend::Redis { .. } => "redis",
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        tenants: state.tenants.registry().tenants().len(),
        cache_backend,
    })
}

/// `/health`, mounted outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
