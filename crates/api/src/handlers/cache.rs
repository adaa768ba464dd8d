//! Handlers for cache administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use workshop_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// DELETE /api/v1/cache/{name}
///
/// Evicts every entry of one named cache. The underlying data is untouched.
pub async fn evict(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<StatusCode> {
    if state.caches.evict(&name).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Cache", name)))
    }
}
