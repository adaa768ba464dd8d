//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Single-statement methods are generic over [`sqlx::PgExecutor`], so they
//! run equally on the pool or inside a (tenant-routed) transaction.
//! Methods issuing several statements take `&mut PgConnection` and expect
//! the caller to own the transaction.

pub mod actor_repo;
pub mod comment_repo;
pub mod country_repo;
pub mod customer_repo;
pub mod movie_repo;
pub mod post_repo;

pub use actor_repo::ActorRepo;
pub use comment_repo::CommentRepo;
pub use country_repo::CountryRepo;
pub use customer_repo::CustomerRepo;
pub use movie_repo::MovieRepo;
pub use post_repo::PostRepo;
