//! Schema-per-tenant routing.
//!
//! Every tenant gets its own PostgreSQL schema holding the movie tables.
//! Requests are routed by opening a transaction whose `search_path` points at
//! the tenant schema, so the regular repositories (which use unqualified
//! table names) read and write that tenant's rows only.

use sqlx::{PgConnection, Postgres, Transaction};
use workshop_core::tenant::{TenantId, TenantRegistry};

use crate::seed::{self, SampleLocale};
use crate::DbPool;

/// DDL for the tables (and their `updated_at` triggers) every tenant schema
/// carries. `{schema}` is replaced with the validated tenant id.
const TENANT_TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "{schema}".actors (
        id          BIGSERIAL PRIMARY KEY,
        first_name  VARCHAR(255) NOT NULL,
        last_name   VARCHAR(255) NOT NULL,
        birthday    DATE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "{schema}".movies (
        id             BIGSERIAL PRIMARY KEY,
        name           VARCHAR(255) NOT NULL,
        producer_name  VARCHAR(255) NOT NULL,
        release_date   DATE NOT NULL,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "{schema}".actors_in_movies (
        movie_id  BIGINT NOT NULL REFERENCES "{schema}".movies (id) ON DELETE CASCADE,
        actor_id  BIGINT NOT NULL REFERENCES "{schema}".actors (id) ON DELETE CASCADE,
        PRIMARY KEY (movie_id, actor_id)
    )"#,
    // `set_updated_at()` is created in `public` by the migrations.
    r#"DROP TRIGGER IF EXISTS trg_actors_updated_at ON "{schema}".actors"#,
    r#"CREATE TRIGGER trg_actors_updated_at
        BEFORE UPDATE ON "{schema}".actors
        FOR EACH ROW EXECUTE FUNCTION public.set_updated_at()"#,
    r#"DROP TRIGGER IF EXISTS trg_movies_updated_at ON "{schema}".movies"#,
    r#"CREATE TRIGGER trg_movies_updated_at
        BEFORE UPDATE ON "{schema}".movies
        FOR EACH ROW EXECUTE FUNCTION public.set_updated_at()"#,
];

/// Routes database work to the schema of the requested tenant.
#[derive(Clone)]
pub struct TenantRouter {
    pool: DbPool,
    registry: TenantRegistry,
}

impl TenantRouter {
    pub fn new(pool: DbPool, registry: TenantRegistry) -> Self {
        Self { pool, registry }
    }

    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }

    /// Begin a transaction scoped to `tenant`'s schema.
    ///
    /// The `search_path` is set with `is_local = true`, so it ends with the
    /// transaction and never leaks onto the pooled connection. Dropping the
    /// transaction without committing rolls it back.
    pub async fn begin(&self, tenant: &TenantId) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        route_to(&mut tx, tenant).await?;
        Ok(tx)
    }

    /// Create the schema and tables of one tenant. Safe to call repeatedly.
    pub async fn provision(&self, tenant: &TenantId) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let create_schema = format!(r#"CREATE SCHEMA IF NOT EXISTS "{}""#, tenant.schema());
        sqlx::query(&create_schema).execute(&mut *tx).await?;

        for ddl in TENANT_TABLES {
            let statement = ddl.replace("{schema}", tenant.schema());
            sqlx::query(&statement).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::info!(tenant = %tenant, "Tenant schema provisioned");
        Ok(())
    }

    /// Provision every registered tenant.
    pub async fn provision_all(&self) -> Result<(), sqlx::Error> {
        for tenant in self.registry.tenants() {
            self.provision(tenant).await?;
        }
        Ok(())
    }

    /// Load the sample movie catalog into every tenant that is still empty.
    ///
    /// The `korean` tenant receives the Korean catalog, all others English.
    pub async fn seed_all(&self) -> Result<(), sqlx::Error> {
        for tenant in self.registry.tenants() {
            let locale = SampleLocale::for_tenant(tenant);
            let mut tx = self.begin(tenant).await?;
            let seeded = seed::seed_movies(&mut tx, locale).await?;
            tx.commit().await?;
            if seeded {
                tracing::info!(tenant = %tenant, ?locale, "Tenant sample data loaded");
            }
        }
        Ok(())
    }
}

/// Point the current transaction at `tenant`'s schema.
pub async fn route_to(conn: &mut PgConnection, tenant: &TenantId) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT set_config('search_path', $1, true)")
        .bind(tenant.schema())
        .execute(conn)
        .await?;
    Ok(())
}
