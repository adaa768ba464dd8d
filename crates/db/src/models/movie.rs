//! Movie entity model, DTOs and read models joining movies with actors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use workshop_core::types::{DbId, Timestamp};

use crate::models::actor::{Actor, CreateActor};

/// A row from the `movies` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: DbId,
    pub name: String,
    pub producer_name: String,
    pub release_date: NaiveDate,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a movie together with its cast.
///
/// `actors` are inserted as new rows; `actor_ids` link existing actors.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMovie {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub producer_name: String,
    pub release_date: NaiveDate,
    #[serde(default)]
    #[validate(nested)]
    pub actors: Vec<CreateActor>,
    #[serde(default)]
    pub actor_ids: Vec<DbId>,
}

/// Optional filters for movie search. Absent fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieFilter {
    pub name: Option<String>,
    pub producer_name: Option<String>,
    pub release_date: Option<NaiveDate>,
}

/// A movie with its full cast.
#[derive(Debug, Clone, Serialize)]
pub struct MovieWithActors {
    #[serde(flatten)]
    pub movie: Movie,
    pub actors: Vec<Actor>,
}

/// Number of actors credited per movie.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct MovieActorCount {
    pub movie_name: String,
    pub actor_count: i64,
}

/// A movie whose producer also appears in its cast.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct MovieWithProducingActor {
    pub movie_name: String,
    pub producer_actor_name: String,
}
