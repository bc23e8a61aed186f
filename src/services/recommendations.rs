use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{MovieQuery, RecommendationItem, RecommendationResponse},
    services::{
        catalog::Catalog, posters::PosterService, recommender, similarity::SimilarityIndex,
    },
};

/// Generates content-based recommendations for one movie
///
/// Ranks the catalog against the query movie using the shared similarity
/// matrix (computing it on first use), then, when `with_posters` is set,
/// decorates each result with a poster. Poster failures never remove or
/// reorder results.
pub async fn get_recommendations(
    catalog: Arc<Catalog>,
    similarity: Arc<SimilarityIndex>,
    posters: &PosterService,
    query: MovieQuery,
    k: usize,
    with_posters: bool,
) -> AppResult<RecommendationResponse> {
    let start = Instant::now();

    // Unknown titles fail here, before the matrix is ever computed
    let index = catalog.resolve(&query)?;
    let query_movie = catalog
        .get(index)
        .cloned()
        .ok_or_else(|| AppError::Internal(format!("catalog row {} is missing", index)))?;
    let (matrix, computed) = similarity.matrix().await?;

    let ranked = recommender::recommend(&catalog, &matrix, index, k)?;

    tracing::info!(
        query = %query,
        k,
        results = ranked.len(),
        matrix_computed = computed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Ranking completed"
    );

    let recommendations = if with_posters {
        let movie_ids: Vec<u64> = ranked.iter().map(|r| r.movie_id).collect();
        let fetched = posters.fetch_posters(&movie_ids).await;
        ranked
            .into_iter()
            .zip(fetched)
            .map(|(rec, poster)| RecommendationItem::new(rec, Some(poster)))
            .collect()
    } else {
        ranked
            .into_iter()
            .map(|rec| RecommendationItem::new(rec, None))
            .collect()
    };

    Ok(RecommendationResponse {
        query: query_movie,
        k,
        recommendations,
    })
}
