//! Repository for the `actors` table.

use sqlx::PgExecutor;
use workshop_core::types::DbId;

use crate::models::actor::{Actor, ActorFilter, CreateActor};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, first_name, last_name, birthday, created_at, updated_at";

/// Provides CRUD operations for actors.
pub struct ActorRepo;

impl ActorRepo {
    /// Insert a new actor, returning the created row.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateActor,
    ) -> Result<Actor, sqlx::Error> {
        let query = format!(
            "INSERT INTO actors (first_name, last_name, birthday)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Actor>(&query)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.birthday)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Actor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM actors WHERE id = $1");
        sqlx::query_as::<_, Actor>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List all actors ordered by id.
    pub async fn list<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<Actor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM actors ORDER BY id");
        sqlx::query_as::<_, Actor>(&query).fetch_all(executor).await
    }

    /// Search actors. Each present filter must match exactly.
    pub async fn search<'e, E: PgExecutor<'e>>(
        executor: E,
        filter: &ActorFilter,
    ) -> Result<Vec<Actor>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM actors
             WHERE ($1::text IS NULL OR first_name = $1)
               AND ($2::text IS NULL OR last_name = $2)
               AND ($3::date IS NULL OR birthday = $3)
             ORDER BY id"
        );
        sqlx::query_as::<_, Actor>(&query)
            .bind(&filter.first_name)
            .bind(&filter.last_name)
            .bind(filter.birthday)
            .fetch_all(executor)
            .await
    }

    /// Delete an actor. Cast links are removed by cascade.
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM actors WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM actors")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
