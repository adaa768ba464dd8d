//! Repository for the `countries` table.

use sqlx::PgExecutor;

use crate::models::country::Country;

const COLUMNS: &str = "code, name, description";

/// Provides lookups and upserts for country reference data.
pub struct CountryRepo;

impl CountryRepo {
    /// Find a country by its (already normalized) code.
    pub async fn find_by_code<'e, E: PgExecutor<'e>>(
        executor: E,
        code: &str,
    ) -> Result<Option<Country>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM countries WHERE code = $1");
        sqlx::query_as::<_, Country>(&query)
            .bind(code)
            .fetch_optional(executor)
            .await
    }

    /// List all countries ordered by code.
    pub async fn list<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<Country>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM countries ORDER BY code");
        sqlx::query_as::<_, Country>(&query).fetch_all(executor).await
    }

    /// Insert a country or replace the existing row with the same code.
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        country: &Country,
    ) -> Result<Country, sqlx::Error> {
        let query = format!(
            "INSERT INTO countries (code, name, description)
             VALUES ($1, $2, $3)
             ON CONFLICT (code) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Country>(&query)
            .bind(&country.code)
            .bind(&country.name)
            .bind(&country.description)
            .fetch_one(executor)
            .await
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, code: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM countries WHERE code = $1")
            .bind(code)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
