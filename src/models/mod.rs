use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie in the catalog
///
/// The movie's position in the catalog is also its row in the embeddings
/// and similarity matrices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub movie_id: u64,
    pub title: String,
}

/// How a recommendation query identifies the seed movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieQuery {
    /// Exact, case-sensitive title match
    Title(String),
    /// Catalog movie ID, used to disambiguate duplicate titles
    MovieId(u64),
}

impl std::fmt::Display for MovieQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovieQuery::Title(title) => write!(f, "title '{}'", title),
            MovieQuery::MovieId(id) => write!(f, "movie_id {}", id),
        }
    }
}

/// A single ranked neighbour of the query movie
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub movie_id: u64,
    pub title: String,
    pub score: f32,
}

/// Outcome of a poster lookup for one recommendation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Poster {
    pub url: String,
    /// False when `url` is the placeholder image
    pub found: bool,
}

/// Recommendation decorated with its poster, as returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationItem {
    pub movie_id: u64,
    pub title: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_found: Option<bool>,
}

impl RecommendationItem {
    pub fn new(recommendation: Recommendation, poster: Option<Poster>) -> Self {
        Self {
            movie_id: recommendation.movie_id,
            title: recommendation.title,
            score: recommendation.score,
            poster_url: poster.as_ref().map(|p| p.url.clone()),
            poster_found: poster.map(|p| p.found),
        }
    }
}

/// Response for the recommendations endpoint
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: Movie,
    pub k: usize,
    pub recommendations: Vec<RecommendationItem>,
}

/// Catalog summary for the catalog endpoint
#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub movies: usize,
    pub dimensions: usize,
    pub similarity_ready: bool,
    pub loaded_at: DateTime<Utc>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Subset of the TMDB `/movie/{id}` response we rely on
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub poster_path: Option<String>,
}
