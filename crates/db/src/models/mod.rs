//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - Where updates are supported, an update DTO with all-`Option` fields

pub mod actor;
pub mod comment;
pub mod country;
pub mod customer;
pub mod movie;
pub mod post;
