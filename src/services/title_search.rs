use crate::{models::Movie, services::catalog::Catalog};

/// Service function for the title picker
///
/// Returns catalog movies in catalog order, filtered by a case-insensitive
/// title substring when `query` is given.
pub fn search_titles(catalog: &Catalog, query: Option<&str>, limit: Option<usize>) -> Vec<Movie> {
    let movies: Vec<Movie> = catalog.search(query, limit).into_iter().cloned().collect();

    tracing::debug!(
        query = query.unwrap_or(""),
        results = movies.len(),
        "Title search completed"
    );

    movies
}
