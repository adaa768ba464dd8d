//! Handlers for the `/countries` resource, served through the read-through
//! near cache.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use workshop_core::error::CoreError;
use workshop_core::validation::validate_input;
use workshop_db::models::country::{normalize_country_code, Country, UpsertCountry};
use workshop_db::repositories::CountryRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/countries
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let countries = CountryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: countries }))
}

/// GET /api/v1/countries/{code}
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let code = normalize_country_code(&code)?;
    let country = find(&state, code).await?;
    Ok(Json(DataResponse { data: country }))
}

/// PUT /api/v1/countries/{code}
///
/// Creates or replaces the country. The cached copy is dropped and reloaded
/// on the next read.
pub async fn upsert(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<UpsertCountry>,
) -> AppResult<impl IntoResponse> {
    let code = normalize_country_code(&code)?;
    validate_input(&input)?;

    let country = Country {
        code: code.clone(),
        name: input.name,
        description: input.description,
    };
    state.caches.countries.put(&code, &country).await?;

    tracing::info!(%code, "Country saved");
    Ok(Json(DataResponse { data: country }))
}

/// DELETE /api/v1/countries/{code}
pub async fn delete(State(state): State<AppState>, Path(code): Path<String>) -> AppResult<StatusCode> {
    let code = normalize_country_code(&code)?;
    find(&state, code.clone()).await?;
    state.caches.countries.remove(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find(state: &AppState, code: String) -> AppResult<Country> {
    state
        .caches
        .countries
        .get(&code)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Country", &code)))
}
