use std::cmp::Ordering;

use ndarray::ArrayView1;

use crate::{
    error::{AppError, AppResult},
    models::Recommendation,
    services::{catalog::Catalog, similarity::SimilarityMatrix},
};

/// Allowed range and default for the number of recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KBounds {
    pub default: usize,
    pub max: usize,
}

impl Default for KBounds {
    fn default() -> Self {
        Self { default: 5, max: 20 }
    }
}

impl KBounds {
    /// Applies the default to a missing `k` and rejects values outside `1..=max`
    pub fn resolve(&self, requested: Option<usize>) -> AppResult<usize> {
        let k = requested.unwrap_or(self.default);
        if k == 0 || k > self.max {
            return Err(AppError::InvalidInput(format!(
                "k must be between 1 and {}, got {}",
                self.max, k
            )));
        }
        Ok(k)
    }
}

/// Returns up to `k` `(index, score)` pairs from `row`, highest score first,
/// never including `exclude`
///
/// Equal scores keep ascending index order.
pub fn top_k(row: ArrayView1<'_, f32>, exclude: usize, k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = row
        .iter()
        .copied()
        .enumerate()
        .filter(|&(index, _)| index != exclude)
        .collect();

    // sort_by is stable, so ties stay in ascending index order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Finds the `k` movies most similar to the movie at catalog row `index`
///
/// The result is ordered by descending similarity, excludes the query
/// movie, and holds `min(k, catalog size - 1)` entries.
pub fn recommend(
    catalog: &Catalog,
    similarity: &SimilarityMatrix,
    index: usize,
    k: usize,
) -> AppResult<Vec<Recommendation>> {
    if k == 0 {
        return Err(AppError::InvalidInput("k must be at least 1".to_string()));
    }

    if catalog.len() != similarity.size() {
        return Err(AppError::Shape(format!(
            "catalog has {} movies but similarity matrix has {} rows",
            catalog.len(),
            similarity.size()
        )));
    }

    if index >= catalog.len() {
        return Err(AppError::Internal(format!(
            "catalog row {} is out of range for {} movies",
            index,
            catalog.len()
        )));
    }

    top_k(similarity.row(index), index, k)
        .into_iter()
        .map(|(other, score)| {
            let movie = catalog.get(other).ok_or_else(|| {
                AppError::Internal(format!("similarity row {} has no catalog entry", other))
            })?;
            Ok(Recommendation {
                movie_id: movie.movie_id,
                title: movie.title.clone(),
                score,
            })
        })
        .collect()
}
