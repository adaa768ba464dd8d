//! Shared domain building blocks for the workshop service.
//!
//! Pure logic only: no database or HTTP dependencies live here.

pub mod error;
pub mod pagination;
pub mod tenant;
pub mod types;
pub mod validation;
