//! Route definitions for the `/posts` resource.
//!
//! Also nests comment routes under `/posts/{id}/comments`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{comment, post};
use crate::state::AppState;

/// Routes mounted at `/posts`.
///
/// ```text
/// GET    /                      -> list
/// POST   /                      -> create
/// GET    /{id}                  -> get_by_id
/// PUT    /{id}                  -> update
/// DELETE /{id}                  -> delete
/// GET    /{id}/comments         -> comment::list_by_post
/// POST   /{id}/comments         -> comment::create
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(post::list).post(post::create))
        .route(
            "/{id}",
            get(post::get_by_id).put(post::update).delete(post::delete),
        )
        .route(
            "/{id}/comments",
            get(comment::list_by_post).post(comment::create),
        )
}
