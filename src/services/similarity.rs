use std::sync::{Arc, OnceLock};
use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{AppError, AppResult};

/// Dense N×D embeddings matrix, one row per catalog movie
///
/// Always non-empty, rectangular, and free of NaN/infinite values.
#[derive(Debug, Clone)]
pub struct Embeddings {
    vectors: Array2<f32>,
}

impl Embeddings {
    /// Builds an embeddings matrix from one vector per item
    ///
    /// Fails with a shape error when there are no rows, a row is empty,
    /// rows differ in length, or any value is not finite.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> AppResult<Self> {
        let dims = match rows.first() {
            Some(first) => first.len(),
            None => return Err(AppError::Shape("embeddings are empty".to_string())),
        };

        if dims == 0 {
            return Err(AppError::Shape(
                "embeddings have zero dimensions".to_string(),
            ));
        }

        let row_count = rows.len();
        let mut flat = Vec::with_capacity(row_count * dims);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dims {
                return Err(AppError::Shape(format!(
                    "ragged embeddings: row {} has {} values, expected {}",
                    i,
                    row.len(),
                    dims
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(AppError::Shape(format!(
                    "non-finite embedding value at row {}, column {}",
                    i, j
                )));
            }
            flat.extend(row);
        }

        let vectors = Array2::from_shape_vec((row_count, dims), flat)?;
        Ok(Self { vectors })
    }

    pub fn rows(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn dims(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.vectors.row(index)
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.vectors.view()
    }
}

/// Square, symmetric matrix of pairwise cosine similarities
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    scores: Array2<f32>,
}

impl SimilarityMatrix {
    /// Computes cosine similarity between every pair of embedding rows
    ///
    /// Similarity is 0 when either vector has zero norm. The diagonal is
    /// exactly 1.0 for non-zero vectors.
    pub fn compute(embeddings: &Embeddings) -> Self {
        // Accumulate in f64, store f32
        let vectors: Array2<f64> = embeddings.view().mapv(f64::from);
        let n = vectors.nrows();

        let norms: Array1<f64> = vectors
            .rows()
            .into_iter()
            .map(|row| row.dot(&row).sqrt())
            .collect();

        let mut scores = Array2::<f32>::zeros((n, n));

        for i in 0..n {
            scores[[i, i]] = if norms[i] > 0.0 { 1.0 } else { 0.0 };

            let a = vectors.row(i);
            for j in (i + 1)..n {
                let denom = norms[i] * norms[j];
                let score = if denom > 0.0 {
                    (a.dot(&vectors.row(j)) / denom).clamp(-1.0, 1.0) as f32
                } else {
                    0.0
                };

                scores[[i, j]] = score;
                scores[[j, i]] = score;
            }
        }

        Self { scores }
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.scores.nrows()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.scores.row(index)
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.scores[[i, j]]
    }
}

/// Process-wide, compute-once holder of the similarity matrix
///
/// The matrix is built the first time it is requested and then shared
/// read-only until the process exits. Concurrent first callers block on the
/// same initialisation rather than computing it twice.
pub struct SimilarityIndex {
    embeddings: Arc<Embeddings>,
    matrix: OnceLock<Arc<SimilarityMatrix>>,
}

impl SimilarityIndex {
    pub fn new(embeddings: Embeddings) -> Self {
        Self {
            embeddings: Arc::new(embeddings),
            matrix: OnceLock::new(),
        }
    }

    pub fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }

    /// Whether the matrix has already been computed
    pub fn is_ready(&self) -> bool {
        self.matrix.get().is_some()
    }

    /// Returns the matrix, computing it on this thread if needed
    ///
    /// The boolean is true only for the call that performed the computation.
    pub fn get_or_compute(&self) -> (Arc<SimilarityMatrix>, bool) {
        let mut computed = false;
        let matrix = self.matrix.get_or_init(|| {
            computed = true;
            let start = Instant::now();
            let matrix = SimilarityMatrix::compute(&self.embeddings);
            tracing::info!(
                items = matrix.size(),
                dimensions = self.embeddings.dims(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Similarity matrix computed"
            );
            Arc::new(matrix)
        });
        (Arc::clone(matrix), computed)
    }

    /// Async accessor that moves the first computation onto the blocking pool
    pub async fn matrix(self: &Arc<Self>) -> AppResult<(Arc<SimilarityMatrix>, bool)> {
        if let Some(matrix) = self.matrix.get() {
            return Ok((Arc::clone(matrix), false));
        }

        let index = Arc::clone(self);
        tokio::task::spawn_blocking(move || index.get_or_compute())
            .await
            .map_err(|e| AppError::Internal(format!("similarity computation failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embeddings(rows: Vec<Vec<f32>>) -> Embeddings {
        Embeddings::from_rows(rows).unwrap()
    }

    #[test]
    fn test_empty_embeddings_rejected() {
        let result = Embeddings::from_rows(vec![]);
        assert!(matches!(result, Err(AppError::Shape(_))));
    }

    #[test]
    fn test_ragged_embeddings_rejected() {
        let result = Embeddings::from_rows(vec![vec![1.0, 0.0], vec![1.0]]);
        match result {
            Err(AppError::Shape(msg)) => assert!(msg.contains("row 1")),
            other => panic!("expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let result = Embeddings::from_rows(vec![vec![], vec![]]);
        assert!(matches!(result, Err(AppError::Shape(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let result = Embeddings::from_rows(vec![vec![1.0, f32::NAN]]);
        assert!(matches!(result, Err(AppError::Shape(_))));
    }

    #[test]
    fn test_embeddings_keep_row_layout() {
        let embeddings = embeddings(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(embeddings.rows(), 2);
        assert_eq!(embeddings.dims(), 3);
        assert_eq!(embeddings.row(1).to_vec(), vec![4.0_f32, 5.0, 6.0]);
        assert_eq!(embeddings.view().shape(), &[2, 3]);
    }

    #[test]
    fn test_basic_cosine_values() {
        let matrix = SimilarityMatrix::compute(&embeddings(vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![-2.0, 0.0],
        ]));

        assert_eq!(matrix.size(), 4);
        assert_eq!(matrix.get(0, 1), 1.0);
        assert_eq!(matrix.get(0, 2), 0.0);
        assert_eq!(matrix.get(0, 3), -1.0);
    }

    #[test]
    fn test_scale_invariance() {
        let matrix =
            SimilarityMatrix::compute(&embeddings(vec![vec![1.0, 1.0], vec![3.0, 3.0]]));
        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_with_unit_diagonal() {
        let matrix = SimilarityMatrix::compute(&embeddings(vec![
            vec![0.3, -1.2, 4.0],
            vec![2.5, 0.1, -0.7],
            vec![-1.0, -1.0, 1.0],
            vec![0.01, 0.02, 0.03],
        ]));

        for i in 0..matrix.size() {
            assert_eq!(matrix.get(i, i), 1.0);
            for j in 0..matrix.size() {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                assert!(matrix.get(i, j) <= 1.0 && matrix.get(i, j) >= -1.0);
            }
        }
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let matrix =
            SimilarityMatrix::compute(&embeddings(vec![vec![0.0, 0.0], vec![1.0, 2.0]]));
        assert_eq!(matrix.get(0, 0), 0.0);
        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.get(1, 0), 0.0);
        assert_eq!(matrix.get(1, 1), 1.0);
    }

    #[test]
    fn test_row_matches_get() {
        let matrix = SimilarityMatrix::compute(&embeddings(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
        ]));
        let row = matrix.row(2);
        assert_eq!(row.len(), 3);
        for (j, score) in row.iter().enumerate() {
            assert_eq!(*score, matrix.get(2, j));
        }
    }

    #[test]
    fn test_index_computes_once() {
        let index = SimilarityIndex::new(embeddings(vec![vec![1.0, 0.0], vec![0.0, 1.0]]));
        assert!(!index.is_ready());

        let (first, computed_first) = index.get_or_compute();
        let (second, computed_second) = index.get_or_compute();

        assert!(computed_first);
        assert!(!computed_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(index.is_ready());
    }

    #[tokio::test]
    async fn test_concurrent_first_access_shares_one_matrix() {
        let index = Arc::new(SimilarityIndex::new(embeddings(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let index = Arc::clone(&index);
            tasks.push(tokio::spawn(async move { index.matrix().await }));
        }

        let mut matrices = Vec::new();
        let mut computations = 0;
        for task in tasks {
            let (matrix, computed) = task.await.unwrap().unwrap();
            if computed {
                computations += 1;
            }
            matrices.push(matrix);
        }

        assert_eq!(computations, 1);
        assert!(matrices.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
