//! Actor entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use workshop_core::types::{DbId, Timestamp};

/// A row from the `actors` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Actor {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub birthday: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new actor.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateActor {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub last_name: String,
    pub birthday: Option<NaiveDate>,
}

/// Optional filters for actor search. Absent fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActorFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
}

impl ActorFilter {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.birthday.is_none()
    }
}
