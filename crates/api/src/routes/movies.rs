//! Route definitions for the `/movies` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::movie;
use crate::state::AppState;

/// Routes mounted at `/movies`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /with-actors         -> list_with_actors
/// GET    /actor-counts        -> actor_counts
/// GET    /acting-producers    -> acting_producers
/// GET    /{id}                -> get_by_id
/// DELETE /{id}                -> delete
/// GET    /{id}/actors         -> get_with_actors
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(movie::list).post(movie::create))
        .route("/with-actors", get(movie::list_with_actors))
        .route("/actor-counts", get(movie::actor_counts))
        .route("/acting-producers", get(movie::acting_producers))
        .route("/{id}", get(movie::get_by_id).delete(movie::delete))
        .route("/{id}/actors", get(movie::get_with_actors))
}
