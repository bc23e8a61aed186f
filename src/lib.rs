//! Content-based movie recommendation service.
//!
//! Loads a movie catalog with precomputed embeddings, ranks movies by cosine
//! similarity, and decorates recommendations with TMDB poster images.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
