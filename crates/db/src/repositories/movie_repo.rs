//! Repository for the `movies` and `actors_in_movies` tables.

use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, PgExecutor};
use workshop_core::types::DbId;

use crate::models::actor::Actor;
use crate::models::movie::{
    CreateMovie, Movie, MovieActorCount, MovieFilter, MovieWithActors, MovieWithProducingActor,
};
use crate::repositories::ActorRepo;

/// Column list for the `movies` table.
const COLUMNS: &str = "id, name, producer_name, release_date, created_at, updated_at";

/// Actor columns qualified with the `a` alias, for JOIN queries.
const ACTOR_COLUMNS: &str =
    "a.id, a.first_name, a.last_name, a.birthday, a.created_at, a.updated_at";

/// One cast link: the movie id plus the full actor row.
#[derive(FromRow)]
struct CastRow {
    movie_id: DbId,
    #[sqlx(flatten)]
    actor: Actor,
}

/// Provides CRUD operations and cast queries for movies.
pub struct MovieRepo;

impl MovieRepo {
    /// Insert a movie, any new actors, and the cast links.
    ///
    /// Runs several statements; call it inside a transaction so a failed
    /// link (e.g. an unknown `actor_ids` entry) rolls back the movie too.
    pub async fn create_with_actors(
        conn: &mut PgConnection,
        input: &CreateMovie,
    ) -> Result<MovieWithActors, sqlx::Error> {
        let query = format!(
            "INSERT INTO movies (name, producer_name, release_date)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(&input.name)
            .bind(&input.producer_name)
            .bind(input.release_date)
            .fetch_one(&mut *conn)
            .await?;

        let mut actor_ids = input.actor_ids.clone();
        for actor in &input.actors {
            let created = ActorRepo::create(&mut *conn, actor).await?;
            actor_ids.push(created.id);
        }

        Self::add_actors(&mut *conn, movie.id, &actor_ids).await?;
        let actors = Self::actors_for_movie(&mut *conn, movie.id).await?;

        tracing::debug!(movie_id = movie.id, cast = actors.len(), "Movie created");
        Ok(MovieWithActors { movie, actors })
    }

    /// Link existing actors to a movie. Already-linked actors are ignored.
    pub async fn add_actors<'e, E: PgExecutor<'e>>(
        executor: E,
        movie_id: DbId,
        actor_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if actor_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO actors_in_movies (movie_id, actor_id)
             SELECT $1, UNNEST($2::bigint[])
             ON CONFLICT DO NOTHING",
        )
        .bind(movie_id)
        .bind(actor_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Search movies with optional exact-match filters, paginated by id.
    pub async fn search<'e, E: PgExecutor<'e>>(
        executor: E,
        filter: &MovieFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Movie>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM movies
             WHERE ($1::text IS NULL OR name = $1)
               AND ($2::text IS NULL OR producer_name = $2)
               AND ($3::date IS NULL OR release_date = $3)
             ORDER BY id
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(&filter.name)
            .bind(&filter.producer_name)
            .bind(filter.release_date)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// The cast of one movie, ordered by actor id.
    pub async fn actors_for_movie<'e, E: PgExecutor<'e>>(
        executor: E,
        movie_id: DbId,
    ) -> Result<Vec<Actor>, sqlx::Error> {
        let query = format!(
            "SELECT {ACTOR_COLUMNS}
             FROM actors a
             JOIN actors_in_movies am ON am.actor_id = a.id
             WHERE am.movie_id = $1
             ORDER BY a.id"
        );
        sqlx::query_as::<_, Actor>(&query)
            .bind(movie_id)
            .fetch_all(executor)
            .await
    }

    /// A movie with its cast, or `None` if the movie does not exist.
    pub async fn find_with_actors(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<MovieWithActors>, sqlx::Error> {
        let Some(movie) = Self::find_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };
        let actors = Self::actors_for_movie(&mut *conn, id).await?;
        Ok(Some(MovieWithActors { movie, actors }))
    }

    /// Every movie with its cast, using two queries regardless of row count.
    pub async fn list_with_actors(
        conn: &mut PgConnection,
    ) -> Result<Vec<MovieWithActors>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies ORDER BY id");
        let movies = sqlx::query_as::<_, Movie>(&query)
            .fetch_all(&mut *conn)
            .await?;

        let cast_query = format!(
            "SELECT am.movie_id, {ACTOR_COLUMNS}
             FROM actors a
             JOIN actors_in_movies am ON am.actor_id = a.id
             ORDER BY am.movie_id, a.id"
        );
        let rows = sqlx::query_as::<_, CastRow>(&cast_query)
            .fetch_all(&mut *conn)
            .await?;

        let mut cast: HashMap<DbId, Vec<Actor>> = HashMap::new();
        for row in rows {
            cast.entry(row.movie_id).or_default().push(row.actor);
        }

        Ok(movies
            .into_iter()
            .map(|movie| {
                let actors = cast.remove(&movie.id).unwrap_or_default();
                MovieWithActors { movie, actors }
            })
            .collect())
    }

    /// Number of actors per movie, including movies without a cast.
    pub async fn actor_counts<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<MovieActorCount>, sqlx::Error> {
        sqlx::query_as::<_, MovieActorCount>(
            "SELECT m.name AS movie_name, COUNT(am.actor_id) AS actor_count
             FROM movies m
             LEFT JOIN actors_in_movies am ON am.movie_id = m.id
             GROUP BY m.id, m.name
             ORDER BY m.id",
        )
        .fetch_all(executor)
        .await
    }

    /// Movies whose producer also acted in them.
    ///
    /// The producer is matched against the cast by first name.
    pub async fn acting_producers<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<MovieWithProducingActor>, sqlx::Error> {
        sqlx::query_as::<_, MovieWithProducingActor>(
            "SELECT m.name AS movie_name,
                    a.first_name || ' ' || a.last_name AS producer_actor_name
             FROM movies m
             JOIN actors_in_movies am ON am.movie_id = m.id
             JOIN actors a ON a.id = am.actor_id
             WHERE m.producer_name = a.first_name
             ORDER BY m.id, a.id",
        )
        .fetch_all(executor)
        .await
    }

    /// Delete a movie. Cast links are removed by cascade; actors are kept.
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
