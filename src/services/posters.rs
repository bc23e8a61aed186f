use std::sync::Arc;
use std::time::Duration;

use crate::{models::Poster, services::providers::PosterProvider};

/// Fetches posters for a batch of movies, isolating per-item failures
///
/// Each lookup runs in its own task under a timeout. A lookup that fails,
/// times out, or panics yields the placeholder image for that movie only.
#[derive(Clone)]
pub struct PosterService {
    provider: Arc<dyn PosterProvider>,
    timeout: Duration,
    placeholder_url: String,
}

impl PosterService {
    pub fn new(provider: Arc<dyn PosterProvider>, timeout: Duration, placeholder_url: String) -> Self {
        Self {
            provider,
            timeout,
            placeholder_url,
        }
    }

    fn placeholder(&self) -> Poster {
        Poster {
            url: self.placeholder_url.clone(),
            found: false,
        }
    }

    /// Returns one poster per movie ID, in the same order as `movie_ids`
    pub async fn fetch_posters(&self, movie_ids: &[u64]) -> Vec<Poster> {
        let tasks: Vec<_> = movie_ids
            .iter()
            .map(|&movie_id| {
                let provider = Arc::clone(&self.provider);
                let timeout = self.timeout;
                tokio::spawn(async move {
                    tokio::time::timeout(timeout, provider.fetch_poster(movie_id)).await
                })
            })
            .collect();

        let mut posters = Vec::with_capacity(tasks.len());
        let mut failures = 0usize;

        for (task, &movie_id) in tasks.into_iter().zip(movie_ids) {
            let poster = match task.await {
                Ok(Ok(Ok(url))) => Poster { url, found: true },
                Ok(Ok(Err(e))) => {
                    tracing::warn!(
                        movie_id,
                        error = %e,
                        provider = self.provider.name(),
                        "Poster fetch failed"
                    );
                    failures += 1;
                    self.placeholder()
                }
                Ok(Err(_)) => {
                    tracing::warn!(
                        movie_id,
                        timeout_ms = self.timeout.as_millis() as u64,
                        provider = self.provider.name(),
                        "Poster fetch timed out"
                    );
                    failures += 1;
                    self.placeholder()
                }
                Err(e) => {
                    tracing::error!(movie_id, error = %e, "Poster task join error");
                    failures += 1;
                    self.placeholder()
                }
            };
            posters.push(poster);
        }

        if failures > 0 {
            tracing::warn!(
                success_count = posters.len() - failures,
                error_count = failures,
                "Partial poster fetch failure"
            );
        }

        posters
    }
}
