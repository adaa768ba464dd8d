//! Comment entity model and DTOs.
//!
//! Comments are written behind a cache: the id and timestamp are assigned
//! here, before the row reaches the database.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use workshop_core::types::{DbId, Timestamp};

/// A row from the `comments` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: DbId,
    pub author: String,
    pub content: String,
    pub created_at: Timestamp,
}

impl Comment {
    /// Build a new comment for `post_id` with a fresh id.
    pub fn new(post_id: DbId, input: CreateComment) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author: input.author,
            content: input.content,
            created_at: Utc::now(),
        }
    }
}

/// DTO for creating a new comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComment {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub author: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub content: String,
}
