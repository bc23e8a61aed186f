use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::services::{Catalog, Dataset, KBounds, PosterService, SimilarityIndex};

/// Shared application state
///
/// Everything here is read-only after startup except the similarity index's
/// compute-once cell.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub similarity: Arc<SimilarityIndex>,
    pub posters: PosterService,
    pub k_bounds: KBounds,
    pub loaded_at: DateTime<Utc>,
}

impl AppState {
    /// Builds the state from a loaded dataset
    pub fn new(dataset: Dataset, posters: PosterService, k_bounds: KBounds) -> Self {
        Self {
            catalog: Arc::new(dataset.catalog),
            similarity: Arc::new(SimilarityIndex::new(dataset.embeddings)),
            posters,
            k_bounds,
            loaded_at: Utc::now(),
        }
    }
}
