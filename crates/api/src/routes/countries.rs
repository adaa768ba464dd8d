//! Route definitions for the `/countries` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::country;
use crate::state::AppState;

/// Routes mounted at `/countries`.
///
/// ```text
/// GET    /          -> list
/// GET    /{code}    -> get_by_code
/// PUT    /{code}    -> upsert
/// DELETE /{code}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(country::list)).route(
        "/{code}",
        get(country::get_by_code)
            .put(country::upsert)
            .delete(country::delete),
    )
}
