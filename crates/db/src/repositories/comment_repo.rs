//! Repository for the `comments` table.

use sqlx::PgExecutor;
use uuid::Uuid;
use workshop_core::types::{DbId, Timestamp};

use crate::models::comment::Comment;

const COLUMNS: &str = "id, post_id, author, content, created_at";

/// Provides persistence for comments, including the batched insert used by
/// the write-behind flusher.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a batch of comments in a single statement.
    ///
    /// Rows whose id already exists are skipped, so replaying a batch is
    /// harmless. Comments whose post no longer exists are dropped rather than
    /// failing the whole batch. Returns the number of rows written.
    pub async fn insert_batch<'e, E: PgExecutor<'e>>(
        executor: E,
        comments: &[Comment],
    ) -> Result<u64, sqlx::Error> {
        if comments.is_empty() {
            return Ok(0);
        }

        let mut ids: Vec<Uuid> = Vec::with_capacity(comments.len());
        let mut post_ids: Vec<DbId> = Vec::with_capacity(comments.len());
        let mut authors: Vec<String> = Vec::with_capacity(comments.len());
        let mut contents: Vec<String> = Vec::with_capacity(comments.len());
        let mut created: Vec<Timestamp> = Vec::with_capacity(comments.len());
        for c in comments {
            ids.push(c.id);
            post_ids.push(c.post_id);
            authors.push(c.author.clone());
            contents.push(c.content.clone());
            created.push(c.created_at);
        }

        let result = sqlx::query(
            "INSERT INTO comments (id, post_id, author, content, created_at)
             SELECT c.id, c.post_id, c.author, c.content, c.created_at
             FROM UNNEST($1::uuid[], $2::bigint[], $3::text[], $4::text[], $5::timestamptz[])
                  AS c(id, post_id, author, content, created_at)
             WHERE EXISTS (SELECT 1 FROM posts p WHERE p.id = c.post_id)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&ids)
        .bind(&post_ids)
        .bind(&authors)
        .bind(&contents)
        .bind(&created)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Persisted comments of a post, oldest first.
    pub async fn list_by_post<'e, E: PgExecutor<'e>>(
        executor: E,
        post_id: DbId,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments WHERE post_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(executor)
            .await
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
