//! Handlers for the `/actors` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use workshop_core::error::CoreError;
use workshop_core::types::DbId;
use workshop_core::validation::validate_input;
use workshop_db::models::actor::{ActorFilter, CreateActor};
use workshop_db::repositories::ActorRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/actors?first_name=&last_name=&birthday=
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ActorFilter>,
) -> AppResult<impl IntoResponse> {
    let actors = if filter.is_empty() {
        ActorRepo::list(&state.pool).await?
    } else {
        ActorRepo::search(&state.pool, &filter).await?
    };
    Ok(Json(DataResponse { data: actors }))
}

/// POST /api/v1/actors
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateActor>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;
    let actor = ActorRepo::create(&state.pool, &input).await?;
    tracing::info!(actor_id = actor.id, "Actor created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: actor })))
}

/// GET /api/v1/actors/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let actor = ActorRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Actor", id)))?;
    Ok(Json(DataResponse { data: actor }))
}

/// DELETE /api/v1/actors/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if ActorRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Actor", id)))
    }
}
