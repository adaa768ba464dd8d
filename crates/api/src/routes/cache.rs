//! Route definitions for cache administration.

use axum::routing::delete;
use axum::Router;

use crate::handlers::cache;
use crate::state::AppState;

/// Routes mounted at `/cache`.
///
/// ```text
/// DELETE /{name}    -> evict
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{name}", delete(cache::evict))
}
