use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workshop_cache::{CacheStore, InMemoryStore, RedisStore};
use workshop_db::seed::{self, SampleLocale};
use workshop_db::tenancy::TenantRouter;

use workshop_api::caching::Caches;
use workshop_api::config::{CacheBackend, ServerConfig};
use workshop_api::router::build_app_router;
use workshop_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workshop_api=debug,workshop_cache=debug,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        tenants = config.tenants.tenants().len(),
        cache_backend = ?config.cache.backend,
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = workshop_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    workshop_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    workshop_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Tenants ---
    let tenants = TenantRouter::new(pool.clone(), config.tenants.clone());
    tenants
        .provision_all()
        .await
        .expect("Failed to provision tenant schemas");
    tracing::info!(default_tenant = %config.tenants.default_tenant(), "Tenant schemas provisioned");

    if config.seed_sample_data {
        seed_sample_data(&pool, &tenants)
            .await
            .expect("Failed to load sample data");
    }

    // --- Caches ---
    let store: Arc<dyn CacheStore> = match &config.cache.backend {
        CacheBackend::Memory => Arc::new(InMemoryStore::new()),
        CacheBackend::Redis { url } => Arc::new(
            RedisStore::connect(url, "workshop")
                .await
                .expect("Failed to connect to Redis"),
        ),
    };
    let (caches, cache_tasks) = Caches::build(pool.clone(), store, &config.cache);
    tracing::info!(caches = ?Caches::names(), "Caches ready");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        tenants,
        caches,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, flushing pending writes");
    cache_tasks
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;

    tracing::info!("Graceful shutdown complete");
}

/// Load the sample catalog into the shared schema and every tenant.
async fn seed_sample_data(pool: &workshop_db::DbPool, tenants: &TenantRouter) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let movies_loaded = seed::seed_movies(&mut tx, SampleLocale::English).await?;
    let countries = seed::seed_countries(&mut tx).await?;
    tx.commit().await?;
    tracing::info!(movies_loaded, countries, "Shared sample data loaded");

    tenants.seed_all().await
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
