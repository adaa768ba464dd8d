//! Handlers for the `/customers` resource.
//!
//! Single-customer reads go through the `customers` cache. Writes hit the
//! database first and the cache is then filled with the row the database
//! returned, so cached timestamps are the stored ones.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use workshop_core::error::CoreError;
use workshop_core::types::DbId;
use workshop_core::validation::validate_input;
use workshop_db::models::customer::{CreateCustomer, Customer, UpdateCustomer};
use workshop_db::repositories::CustomerRepo;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/customers?limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.resolve();
    let customers = CustomerRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: customers }))
}

/// POST /api/v1/customers
///
/// The database assigns the id, so the row is inserted directly and the
/// cache is filled afterwards.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomer>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;
    let customer = CustomerRepo::create(&state.pool, &input).await?;
    state.caches.customers.refresh(&customer.id, &customer).await?;

    tracing::info!(customer_id = customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: customer })))
}

/// GET /api/v1/customers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let customer = find(&state, id).await?;
    Ok(Json(DataResponse { data: customer }))
}

/// PUT /api/v1/customers/{id}
///
/// Fields left out of the body keep their current value. The patch is
/// applied in a single `UPDATE`, so it never recreates a deleted customer
/// and concurrent patches of different fields both survive.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCustomer>,
) -> AppResult<impl IntoResponse> {
    validate_input(&input)?;

    let Some(updated) = CustomerRepo::update(&state.pool, id, &input).await? else {
        state.caches.customers.invalidate(&id).await?;
        return Err(AppError::Core(CoreError::not_found("Customer", id)));
    };
    state.caches.customers.refresh(&id, &updated).await?;

    tracing::info!(customer_id = id, "Customer updated");
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/customers/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    find(&state, id).await?;
    state.caches.customers.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find(state: &AppState, id: DbId) -> AppResult<Customer> {
    state
        .caches
        .customers
        .get(&id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Customer", id)))
}
