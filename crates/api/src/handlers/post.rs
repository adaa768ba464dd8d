//! Handlers for the `/posts` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use workshop_core::error::CoreError;
use workshop_core::types::DbId;
use workshop_core::validation::validate_input;
use workshop_db::models::post::{CreatePost, PostWithComments, UpdatePost};
use workshop_db::repositories::{CommentRepo, PostRepo};

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/posts?limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.resolve();
    let posts = PostRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: posts }))
}

/// POST /api/v1/posts
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreatePost>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;
    let post = PostRepo::create(&state.pool, &input).await?;
    tracing::info!(post_id = post.id, "Post created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: post })))
}

/// GET /api/v1/posts/{id}
///
/// Returns the post with its persisted comments.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let post = PostRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Post", id)))?;
    let comments = CommentRepo::list_by_post(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: PostWithComments { post, comments },
    }))
}

/// PUT /api/v1/posts/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePost>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;
    let post = PostRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Post", id)))?;
    Ok(Json(DataResponse { data: post }))
}

/// DELETE /api/v1/posts/{id}
///
/// Comments are removed by cascade.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if PostRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Post", id)))
    }
}
