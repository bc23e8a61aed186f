//! Poster image providers
//!
//! A provider turns a catalog movie ID into a poster image URL by asking a
//! remote movie-metadata service. Lookups are fallible and independent of
//! each other, so callers fetch them per item and tolerate failures.

use crate::error::AppResult;

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for poster image providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// Fetch the poster image URL for a movie ID
    async fn fetch_poster(&self, movie_id: u64) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
