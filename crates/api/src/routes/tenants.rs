//! Route definitions for the tenant-routed resources.

use axum::routing::get;
use axum::Router;

use crate::handlers::tenant;
use crate::state::AppState;

/// Routes mounted at `/tenant`. The schema is chosen by `X-Tenant-Id`.
///
/// ```text
/// GET    /actors          -> list_actors
/// POST   /actors          -> create_actor
/// GET    /actors/{id}     -> get_actor
/// DELETE /actors/{id}     -> delete_actor
/// GET    /movies          -> list_movies
/// POST   /movies          -> create_movie
/// GET    /movies/{id}     -> get_movie
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actors", get(tenant::list_actors).post(tenant::create_actor))
        .route(
            "/actors/{id}",
            get(tenant::get_actor).delete(tenant::delete_actor),
        )
        .route("/movies", get(tenant::list_movies).post(tenant::create_movie))
        .route("/movies/{id}", get(tenant::get_movie))
}
