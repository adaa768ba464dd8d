//! Handlers for the tenant-routed `/tenant/*` resources.
//!
//! Every handler opens a transaction bound to the caller's tenant schema and
//! runs the ordinary repositories inside it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use workshop_core::error::CoreError;
use workshop_core::tenant::TenantId;
use workshop_core::types::DbId;
use workshop_core::validation::validate_input;
use workshop_db::models::actor::{ActorFilter, CreateActor};
use workshop_db::models::movie::CreateMovie;
use workshop_db::repositories::{ActorRepo, MovieRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::movie::MovieListParams;
use crate::middleware::tenant::TenantContext;
use crate::response::DataResponse;
use crate::state::AppState;

/// Configured tenants and the one used when no header is sent.
#[derive(Debug, Serialize)]
pub struct TenantList {
    pub tenants: Vec<TenantId>,
    pub default_tenant: TenantId,
}

/// GET /api/v1/tenants
pub async fn list_tenants(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let registry = state.tenants.registry();
    Ok(Json(DataResponse {
        data: TenantList {
            tenants: registry.tenants().to_vec(),
            default_tenant: registry.default_tenant().clone(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// GET /api/v1/tenant/actors?first_name=&last_name=&birthday=
pub async fn list_actors(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Query(filter): Query<ActorFilter>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.tenants.begin(&tenant).await?;
    let actors = if filter.is_empty() {
        ActorRepo::list(&mut *tx).await?
    } else {
        ActorRepo::search(&mut *tx, &filter).await?
    };
    tx.commit().await?;
    Ok(Json(DataResponse { data: actors }))
}

/// POST /api/v1/tenant/actors
pub async fn create_actor(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Json(input): Json<CreateActor>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;

    let mut tx = state.tenants.begin(&tenant).await?;
    let actor = ActorRepo::create(&mut *tx, &input).await?;
    tx.commit().await?;

    tracing::info!(%tenant, actor_id = actor.id, "Tenant actor created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: actor })))
}

/// GET /api/v1/tenant/actors/{id}
pub async fn get_actor(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.tenants.begin(&tenant).await?;
    let actor = ActorRepo::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Actor", id)))?;
    tx.commit().await?;
    Ok(Json(DataResponse { data: actor }))
}

/// DELETE /api/v1/tenant/actors/{id}
pub async fn delete_actor(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut tx = state.tenants.begin(&tenant).await?;
    let deleted = ActorRepo::delete(&mut *tx, id).await?;
    tx.commit().await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Actor", id)))
    }
}

// ---------------------------------------------------------------------------
// Movies
// ---------------------------------------------------------------------------

/// GET /api/v1/tenant/movies?limit=&offset=&name=&producer_name=&release_date=
pub async fn list_movies(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Query(params): Query<MovieListParams>,
) -> AppResult<impl IntoResponse> {
    let (filter, (limit, offset)) = params.into_parts();

    let mut tx = state.tenants.begin(&tenant).await?;
    let movies = MovieRepo::search(&mut *tx, &filter, limit, offset).await?;
    tx.commit().await?;
    Ok(Json(DataResponse { data: movies }))
}

/// POST /api/v1/tenant/movies
pub async fn create_movie(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Json(input): Json<CreateMovie>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;

    let mut tx = state.tenants.begin(&tenant).await?;
    let movie = MovieRepo::create_with_actors(&mut tx, &input).await?;
    tx.commit().await?;

    tracing::info!(%tenant, movie_id = movie.movie.id, "Tenant movie created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: movie })))
}

/// GET /api/v1/tenant/movies/{id}
///
/// Returns the movie together with its cast.
pub async fn get_movie(
    State(state): State<AppState>,
    TenantContext(tenant): TenantContext,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.tenants.begin(&tenant).await?;
    let movie = MovieRepo::find_with_actors(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Movie", id)))?;
    tx.commit().await?;
    Ok(Json(DataResponse { data: movie }))
}
