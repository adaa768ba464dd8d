//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to repositories in `workshop_db` (or to the named caches)
//! and map errors via [`AppError`](crate::error::AppError).

pub mod actor;
pub mod cache;
pub mod comment;
pub mod country;
pub mod customer;
pub mod movie;
pub mod post;
pub mod tenant;
