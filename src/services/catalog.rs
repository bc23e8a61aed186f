use std::collections::HashMap;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieQuery},
    services::similarity::Embeddings,
};

/// Ordered, read-only collection of recommendable movies
///
/// A movie's position in the catalog is its row in the embeddings matrix.
#[derive(Debug)]
pub struct Catalog {
    movies: Vec<Movie>,
    by_title: HashMap<String, Vec<usize>>,
    by_id: HashMap<u64, usize>,
}

impl Catalog {
    /// Builds the catalog and its lookup indexes
    ///
    /// Duplicate movie IDs are rejected. Duplicate titles are kept and
    /// reported as ambiguous at lookup time.
    pub fn new(movies: Vec<Movie>) -> AppResult<Self> {
        let mut by_title: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_id = HashMap::with_capacity(movies.len());

        for (index, movie) in movies.iter().enumerate() {
            if let Some(previous) = by_id.insert(movie.movie_id, index) {
                return Err(AppError::DataLoad(format!(
                    "duplicate movie_id {} at catalog rows {} and {}",
                    movie.movie_id, previous, index
                )));
            }
            by_title.entry(movie.title.clone()).or_default().push(index);
        }

        let duplicate_titles = by_title.values().filter(|rows| rows.len() > 1).count();
        if duplicate_titles > 0 {
            tracing::warn!(
                duplicate_titles,
                "Catalog contains duplicate titles; title queries for them require a movie_id"
            );
        }

        Ok(Self {
            movies,
            by_title,
            by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    /// Resolves a query to the movie's catalog row
    pub fn resolve(&self, query: &MovieQuery) -> AppResult<usize> {
        match query {
            MovieQuery::MovieId(movie_id) => self
                .by_id
                .get(movie_id)
                .copied()
                .ok_or_else(|| AppError::NotFound(format!("No movie with id {}", movie_id))),
            MovieQuery::Title(title) => match self.by_title.get(title).map(Vec::as_slice) {
                None | Some([]) => Err(AppError::NotFound(format!(
                    "Movie '{}' not found in catalog",
                    title
                ))),
                Some([index]) => Ok(*index),
                Some(indices) => Err(AppError::AmbiguousTitle {
                    title: title.clone(),
                    movie_ids: indices.iter().map(|&i| self.movies[i].movie_id).collect(),
                }),
            },
        }
    }

    /// Lists movies in catalog order, optionally filtered by a
    /// case-insensitive substring of the title
    pub fn search(&self, query: Option<&str>, limit: Option<usize>) -> Vec<&Movie> {
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        self.movies
            .iter()
            .filter(|movie| match &needle {
                Some(needle) => movie.title.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Catalog and embeddings loaded together, aligned row for row
#[derive(Debug)]
pub struct Dataset {
    pub catalog: Catalog,
    pub embeddings: Embeddings,
}

impl Dataset {
    /// Pairs a catalog with its embeddings, checking they line up 1:1
    pub fn new(catalog: Catalog, embeddings: Embeddings) -> AppResult<Self> {
        if catalog.len() != embeddings.rows() {
            return Err(AppError::Shape(format!(
                "catalog has {} movies but embeddings have {} rows",
                catalog.len(),
                embeddings.rows()
            )));
        }
        Ok(Self {
            catalog,
            embeddings,
        })
    }

    /// Loads the catalog and embeddings JSON files
    pub fn load(catalog_path: impl AsRef<Path>, embeddings_path: impl AsRef<Path>) -> AppResult<Self> {
        let catalog = load_catalog(catalog_path.as_ref())?;
        let embeddings = load_embeddings(embeddings_path.as_ref())?;
        let dataset = Self::new(catalog, embeddings)?;

        tracing::info!(
            movies = dataset.catalog.len(),
            dimensions = dataset.embeddings.dims(),
            "Dataset loaded"
        );

        Ok(dataset)
    }
}

fn read_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::DataLoad(format!("failed to read {}: {}", path.display(), e)))
}

/// Reads a catalog file: a JSON array of `{ "movie_id": .., "title": .. }`
pub fn load_catalog(path: &Path) -> AppResult<Catalog> {
    let contents = read_file(path)?;
    let movies: Vec<Movie> = serde_json::from_str(&contents)
        .map_err(|e| AppError::DataLoad(format!("invalid catalog {}: {}", path.display(), e)))?;
    let catalog = Catalog::new(movies)?;
    if catalog.is_empty() {
        return Err(AppError::DataLoad(format!(
            "catalog {} has no movies",
            path.display()
        )));
    }
    Ok(catalog)
}

/// Reads an embeddings file: a JSON array of equal-length number arrays
pub fn load_embeddings(path: &Path) -> AppResult<Embeddings> {
    let contents = read_file(path)?;
    let rows: Vec<Vec<f32>> = serde_json::from_str(&contents).map_err(|e| {
        AppError::DataLoad(format!("invalid embeddings {}: {}", path.display(), e))
    })?;
    Embeddings::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn movie(movie_id: u64, title: &str) -> Movie {
        Movie {
            movie_id,
            title: title.to_string(),
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![
            movie(19995, "Avatar"),
            movie(285, "Pirates of the Caribbean: At World's End"),
            movie(206647, "Spectre"),
            movie(949, "Heat"),
            movie(10432, "Heat"),
        ])
        .unwrap()
    }

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_by_title() {
        let catalog = sample_catalog();
        assert_eq!(
            catalog
                .resolve(&MovieQuery::Title("Spectre".to_string()))
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let catalog = sample_catalog();
        let result = catalog.resolve(&MovieQuery::Title("spectre".to_string()));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_resolve_by_id() {
        let catalog = sample_catalog();
        assert_eq!(catalog.resolve(&MovieQuery::MovieId(10432)).unwrap(), 4);
        assert!(matches!(
            catalog.resolve(&MovieQuery::MovieId(1)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_title_is_ambiguous() {
        let catalog = sample_catalog();
        match catalog.resolve(&MovieQuery::Title("Heat".to_string())) {
            Err(AppError::AmbiguousTitle { title, movie_ids }) => {
                assert_eq!(title, "Heat");
                assert_eq!(movie_ids, vec![949, 10432]);
            }
            other => panic!("expected ambiguous title, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_movie_id_rejected() {
        let result = Catalog::new(vec![movie(1, "A"), movie(1, "B")]);
        assert!(matches!(result, Err(AppError::DataLoad(_))));
    }

    #[test]
    fn test_search_filters_case_insensitively() {
        let catalog = sample_catalog();
        let titles: Vec<&str> = catalog
            .search(Some("CARIBBEAN"), None)
            .iter()
            .map(|m| m.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Pirates of the Caribbean: At World's End"]);
    }

    #[test]
    fn test_search_without_query_keeps_order_and_limit() {
        let catalog = sample_catalog();
        let ids: Vec<u64> = catalog
            .search(Some("  "), Some(2))
            .iter()
            .map(|m| m.movie_id)
            .collect();
        assert_eq!(ids, vec![19995, 285]);
    }

    #[test]
    fn test_dataset_rejects_misaligned_rows() {
        let catalog = Catalog::new(vec![movie(1, "A"), movie(2, "B")]).unwrap();
        let embeddings = Embeddings::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            Dataset::new(catalog, embeddings),
            Err(AppError::Shape(_))
        ));
    }

    #[test]
    fn test_load_from_files() {
        let catalog_file = write_temp(
            r#"[
                {"movie_id": 1, "title": "A", "overview": "ignored"},
                {"movie_id": 2, "title": "B"}
            ]"#,
        );
        let embeddings_file = write_temp("[[1.0, 0.0], [0.5, 0.5]]");

        let dataset = Dataset::load(catalog_file.path(), embeddings_file.path()).unwrap();
        assert_eq!(dataset.catalog.len(), 2);
        assert_eq!(dataset.embeddings.dims(), 2);
        assert_eq!(dataset.embeddings.row(1).to_vec(), vec![0.5_f32, 0.5]);
    }

    #[test]
    fn test_load_empty_catalog_file() {
        let catalog_file = write_temp("[]");
        assert!(matches!(
            load_catalog(catalog_file.path()),
            Err(AppError::DataLoad(_))
        ));
    }

    #[test]
    fn test_load_ragged_embeddings_file() {
        let embeddings_file = write_temp("[[1.0, 0.0], [0.5]]");
        assert!(matches!(
            load_embeddings(embeddings_file.path()),
            Err(AppError::Shape(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_catalog(Path::new("/nonexistent/movies.json"));
        assert!(matches!(result, Err(AppError::DataLoad(_))));
    }

    #[test]
    fn test_load_malformed_catalog() {
        let catalog_file = write_temp(r#"{"movie_id": 1}"#);
        assert!(matches!(
            load_catalog(catalog_file.path()),
            Err(AppError::DataLoad(_))
        ));
    }
}
