use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{CatalogStats, Movie, MovieQuery, RecommendationResponse},
    services::{recommendations, title_search},
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct TitleListQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: Option<String>,
    pub movie_id: Option<u64>,
    pub k: Option<usize>,
    pub posters: Option<bool>,
}

impl RecommendationQuery {
    /// Exactly one of `title` and `movie_id` identifies the seed movie
    pub fn movie_query(&self) -> AppResult<MovieQuery> {
        match (&self.title, self.movie_id) {
            (Some(title), None) => Ok(MovieQuery::Title(title.clone())),
            (None, Some(movie_id)) => Ok(MovieQuery::MovieId(movie_id)),
            (Some(_), Some(_)) => Err(AppError::InvalidInput(
                "Provide either title or movie_id, not both".to_string(),
            )),
            (None, None) => Err(AppError::InvalidInput(
                "Either title or movie_id is required".to_string(),
            )),
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// List catalog titles for the movie picker
pub async fn list_titles(
    State(state): State<AppState>,
    Query(params): Query<TitleListQuery>,
) -> Json<Vec<Movie>> {
    Json(title_search::search_titles(
        &state.catalog,
        params.q.as_deref(),
        params.limit,
    ))
}

/// Catalog size, embedding width and similarity readiness
pub async fn catalog_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(CatalogStats {
        movies: state.catalog.len(),
        dimensions: state.similarity.embeddings().dims(),
        similarity_ready: state.similarity.is_ready(),
        loaded_at: state.loaded_at,
    })
}

/// Top-K similar movies for a title or movie ID
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let query = params.movie_query()?;
    let k = state.k_bounds.resolve(params.k)?;
    let with_posters = params.posters.unwrap_or(true);

    tracing::info!(
        request_id = %request_id,
        query = %query,
        k,
        with_posters,
        "Processing recommendation request"
    );

    let response = recommendations::get_recommendations(
        state.catalog.clone(),
        state.similarity.clone(),
        &state.posters,
        query,
        k,
        with_posters,
    )
    .await?;

    Ok(Json(response))
}

/// Compute the similarity matrix ahead of the first recommendation
pub async fn prewarm(State(state): State<AppState>) -> AppResult<Json<Value>> {
    tracing::info!("Prewarming similarity matrix...");

    let (_, first_prewarm) = state.similarity.matrix().await?;

    Ok(Json(json!({
        "status": "ok",
        "first_prewarm": first_prewarm,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
