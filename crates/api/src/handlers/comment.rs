//! Handlers for comments, which are written behind the `comments` cache.
//!
//! A new comment is visible through `GET /comments/{id}` as soon as it is
//! accepted; it shows up in a post's comment list once the write-behind
//! flusher has persisted it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;
use workshop_core::error::CoreError;
use workshop_core::types::DbId;
use workshop_core::validation::validate_input;
use workshop_db::models::comment::{Comment, CreateComment};
use workshop_db::repositories::{CommentRepo, PostRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/posts/{id}/comments
pub async fn list_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_post_exists(&state, post_id).await?;
    let comments = CommentRepo::list_by_post(&state.pool, post_id).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /api/v1/posts/{id}/comments
///
/// Responds with 201 once the comment is cached and queued for persistence.
pub async fn create(
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
    Json(input): Json<CreateComment>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;
    ensure_post_exists(&state, post_id).await?;

    let comment = Comment::new(post_id, input);
    state.caches.comments.put(&comment.id, &comment).await?;

    tracing::debug!(comment_id = %comment.id, post_id, "Comment queued");
    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// GET /api/v1/comments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let comment = state
        .caches
        .comments
        .get(&id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Comment", id)))?;
    Ok(Json(DataResponse { data: comment }))
}

/// DELETE /api/v1/comments/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state
        .caches
        .comments
        .get(&id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Comment", id)))?;
    state.caches.comments.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_post_exists(state: &AppState, post_id: DbId) -> AppResult<()> {
    PostRepo::find_by_id(&state.pool, post_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Core(CoreError::not_found("Post", post_id)))
}
