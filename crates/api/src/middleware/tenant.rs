//! Tenant resolution extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use workshop_core::tenant::{TenantId, TENANT_HEADER};

use crate::error::AppError;
use crate::state::AppState;

/// The tenant a request is addressed to, taken from the `X-Tenant-Id` header.
///
/// A request without the header is served by the default tenant. Unknown
/// tenants are rejected with 404, malformed ids with 400.
///
/// ```ignore
/// async fn my_handler(TenantContext(tenant): TenantContext) -> AppResult<Json<()>> {
///     tracing::info!(%tenant, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TenantContext(pub TenantId);

impl FromRequestParts<AppState> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = match parts.headers.get(TENANT_HEADER) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| {
                AppError::BadRequest(format!("{TENANT_HEADER} header is not valid UTF-8"))
            })?),
        };

        let tenant = state.tenants.registry().resolve(raw)?;
        Ok(TenantContext(tenant))
    }
}
