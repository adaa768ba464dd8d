#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use workshop_cache::{InMemoryStore, WriteBehindConfig};
use workshop_core::tenant::{TenantRegistry, TENANT_HEADER};
use workshop_db::tenancy::TenantRouter;

use workshop_api::caching::Caches;
use workshop_api::config::{CacheBackend, CacheConfig, ServerConfig};
use workshop_api::router::build_app_router;
use workshop_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Write-behind flushes every 20ms so tests can observe persisted comments
/// quickly.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: String::new(),
        db_max_connections: 5,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        tenants: TenantRegistry::from_list("korean,english", None).unwrap(),
        cache: CacheConfig {
            backend: CacheBackend::Memory,
            ttl: Duration::from_secs(60),
            near_ttl: Duration::from_secs(5),
            near_max_entries: 100,
            write_behind: WriteBehindConfig {
                batch_size: 10,
                flush_interval: Duration::from_millis(20),
                max_retries: 1,
                retry_delay: Duration::from_millis(10),
                capacity: 100,
            },
        },
        seed_sample_data: false,
    }
}

/// Build the shared state over `pool` with an in-memory cache store.
///
/// Starts the write-behind flusher, so it must run inside a tokio runtime.
pub fn build_test_state(pool: PgPool) -> AppState {
    build_test_state_with(pool, test_config())
}

/// Like [`build_test_state`], with a caller-supplied configuration.
pub fn build_test_state_with(pool: PgPool, config: ServerConfig) -> AppState {
    let tenants = TenantRouter::new(pool.clone(), config.tenants.clone());
    let (caches, _tasks) = Caches::build(pool.clone(), Arc::new(InMemoryStore::new()), &config.cache);

    AppState {
        pool,
        config: Arc::new(config),
        tenants,
        caches,
    }
}

/// Build the full application router with all middleware layers.
///
/// Uses [`build_app_router`] so integration tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery)
/// that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    app_for(build_test_state(pool))
}

/// Build a router over an existing state, sharing its caches.
pub fn app_for(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    build_app_router(state, &config)
}

/// Create the tenant schemas of the test configuration.
pub async fn provision_tenants(state: &AppState) {
    state.tenants.provision_all().await.unwrap();
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_as_tenant(app: Router, uri: &str, tenant: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(TENANT_HEADER, tenant)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body, None)).await
}

pub async fn post_json_as_tenant(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    tenant: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body, Some(tenant))).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, body, None)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn json_request(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    tenant: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(tenant) = tenant {
        builder = builder.header(TENANT_HEADER, tenant);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
