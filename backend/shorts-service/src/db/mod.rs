/// Database access layer
///
/// This module provides repository ports and their PostgreSQL
/// implementations for shorts and posts.

pub mod post_repo;
pub mod shorts_repo;

pub use post_repo::{PgPostRepository, PostRepository};
pub use shorts_repo::{PgShortsRepository, ShortsRepository};
