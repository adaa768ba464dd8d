use std::sync::Arc;

use workshop_db::tenancy::TenantRouter;

use crate::caching::Caches;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: workshop_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Routes `/tenant/*` requests to the tenant's schema.
    pub tenants: TenantRouter,
    /// Named caches (customers, countries, comments).
    pub caches: Caches,
}
