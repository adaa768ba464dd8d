//! Customer entity model and DTOs.
//!
//! Customers are served through a write-through cache, so the row type is
//! also `Deserialize`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use workshop_core::types::{DbId, Timestamp};

/// A row from the `customers` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new customer.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomer {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// DTO for updating a customer. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCustomer {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
}
