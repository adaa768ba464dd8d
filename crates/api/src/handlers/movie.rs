//! Handlers for the `/movies` resource and its cast queries.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use workshop_core::error::CoreError;
use workshop_core::types::DbId;
use workshop_core::validation::validate_input;
use workshop_db::models::movie::{CreateMovie, MovieFilter};
use workshop_db::repositories::MovieRepo;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /movies`.
#[derive(Debug, Default, Deserialize)]
pub struct MovieListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub name: Option<String>,
    pub producer_name: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl MovieListParams {
    /// Split into the repository filter and clamped `(limit, offset)`.
    pub fn into_parts(self) -> (MovieFilter, (i64, i64)) {
        let page = PaginationParams {
            limit: self.limit,
            offset: self.offset,
        }
        .resolve();
        let filter = MovieFilter {
            name: self.name,
            producer_name: self.producer_name,
            release_date: self.release_date,
        };
        (filter, page)
    }
}

/// GET /api/v1/movies?limit=&offset=&name=&producer_name=&release_date=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<MovieListParams>,
) -> AppResult<impl IntoResponse> {
    let (filter, (limit, offset)) = params.into_parts();
    let movies = MovieRepo::search(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse { data: movies }))
}

/// POST /api/v1/movies
///
/// Creates the movie, any new actors and the cast links in one transaction.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateMovie>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;

    let mut tx = state.pool.begin().await?;
    let movie = MovieRepo::create_with_actors(&mut tx, &input).await?;
    tx.commit().await?;

    tracing::info!(movie_id = movie.movie.id, cast = movie.actors.len(), "Movie created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: movie })))
}

/// GET /api/v1/movies/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let movie = MovieRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Movie", id)))?;
    Ok(Json(DataResponse { data: movie }))
}

/// GET /api/v1/movies/{id}/actors
pub async fn get_with_actors(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let movie = MovieRepo::find_with_actors(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Movie", id)))?;
    Ok(Json(DataResponse { data: movie }))
}

/// GET /api/v1/movies/with-actors
pub async fn list_with_actors(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let mut conn = state.pool.acquire().await?;
    let movies = MovieRepo::list_with_actors(&mut conn).await?;
    Ok(Json(DataResponse { data: movies }))
}

/// GET /api/v1/movies/actor-counts
pub async fn actor_counts(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let counts = MovieRepo::actor_counts(&state.pool).await?;
    Ok(Json(DataResponse { data: counts }))
}

/// GET /api/v1/movies/acting-producers
pub async fn acting_producers(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let movies = MovieRepo::acting_producers(&state.pool).await?;
    Ok(Json(DataResponse { data: movies }))
}

/// DELETE /api/v1/movies/{id}
///
/// The cast links go with the movie; the actors stay.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if MovieRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Movie", id)))
    }
}
