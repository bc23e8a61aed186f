//! TMDB poster provider
//!
//! API Flow:
//! 1. Details: /movie/{movie_id}?api_key=..&language=en-US → JSON with `poster_path`
//! 2. Image URL: poster base URL + `poster_path`
//!
//! Resolved URLs are cached in Redis when a cache is configured.

use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::{AppError, AppResult},
    models::TmdbMovieDetails,
    services::providers::PosterProvider,
};

const POSTER_CACHE_TTL: u64 = 604800; // 1 week
const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    poster_base_url: String,
    cache: Option<Cache>,
}

impl TmdbProvider {
    /// Creates a TMDB provider whose HTTP requests time out after `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        poster_base_url: String,
        timeout: Duration,
        cache: Option<Cache>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            poster_base_url,
            cache,
        })
    }

    /// Joins the poster base URL and a TMDB poster path with a single slash
    pub fn poster_url(base_url: &str, poster_path: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            poster_path.trim_start_matches('/')
        )
    }

    /// Extracts the poster URL from a TMDB movie details body
    fn parse_details(&self, movie_id: u64, body: &str) -> AppResult<String> {
        let details: TmdbMovieDetails = serde_json::from_str(body).map_err(|e| {
            AppError::ExternalApi(format!(
                "Failed to parse TMDB response for movie {}: {}",
                movie_id, e
            ))
        })?;

        match details.poster_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(Self::poster_url(&self.poster_base_url, path)),
            _ => Err(AppError::ExternalApi(format!(
                "TMDB has no poster for movie {}",
                movie_id
            ))),
        }
    }

    async fn fetch_uncached(&self, movie_id: u64) -> AppResult<String> {
        let url = format!("{}/movie/{}", self.api_url, movie_id);

        // The request URL carries the API key, so it is stripped from errors
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .send()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {} for movie {}: {}",
                status, movie_id, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;
        tracing::debug!(movie_id, response = %body, "Raw TMDB API response");

        let poster_url = self.parse_details(movie_id, &body)?;

        tracing::debug!(
            movie_id,
            poster_url = %poster_url,
            provider = "tmdb",
            "Poster fetched"
        );

        Ok(poster_url)
    }
}

#[async_trait::async_trait]
impl PosterProvider for TmdbProvider {
    async fn fetch_poster(&self, movie_id: u64) -> AppResult<String> {
        cached!(
            self.cache.as_ref(),
            CacheKey::Poster(movie_id),
            POSTER_CACHE_TTL,
            self.fetch_uncached(movie_id)
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider() -> TmdbProvider {
        TmdbProvider::new(
            "test_key".to_string(),
            "http://test.local/3/".to_string(),
            "https://image.tmdb.org/t/p/w500/".to_string(),
            Duration::from_secs(1),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let provider = create_test_provider();
        assert_eq!(provider.api_url, "http://test.local/3");
    }

    #[test]
    fn test_poster_url_single_slash() {
        assert_eq!(
            TmdbProvider::poster_url("https://image.tmdb.org/t/p/w500/", "/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"),
            "https://image.tmdb.org/t/p/w500/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"
        );
        assert_eq!(
            TmdbProvider::poster_url("https://image.tmdb.org/t/p/w500", "abc.jpg"),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
    }

    #[test]
    fn test_parse_details_with_poster() {
        let provider = create_test_provider();
        let body = r#"{
            "id": 19995,
            "title": "Avatar",
            "poster_path": "/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"
        }"#;

        assert_eq!(
            provider.parse_details(19995, body).unwrap(),
            "https://image.tmdb.org/t/p/w500/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"
        );
    }

    #[test]
    fn test_parse_details_null_poster() {
        let provider = create_test_provider();
        let result = provider.parse_details(1, r#"{"id": 1, "poster_path": null}"#);
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[test]
    fn test_parse_details_empty_poster() {
        let provider = create_test_provider();
        let result = provider.parse_details(1, r#"{"poster_path": ""}"#);
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[test]
    fn test_parse_details_malformed_body() {
        let provider = create_test_provider();
        let result = provider.parse_details(1, "<html>rate limited</html>");
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let provider = TmdbProvider::new(
            "test_key".to_string(),
            "http://127.0.0.1:9".to_string(),
            "https://image.tmdb.org/t/p/w500".to_string(),
            Duration::from_millis(500),
            None,
        )
        .unwrap();

        assert!(provider.fetch_poster(19995).await.is_err());
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let api_key = "SECRET_KEY_123";
        let provider = TmdbProvider::new(
            api_key.to_string(),
            "http://127.0.0.1:9".to_string(),
            "https://image.tmdb.org/t/p/w500".to_string(),
            Duration::from_millis(500),
            None,
        )
        .unwrap();

        let err = provider.fetch_poster(19995).await.unwrap_err();
        assert!(matches!(err, AppError::HttpClient(_)));
        assert!(!err.to_string().contains(api_key));
        assert!(!format!("{:?}", err).contains(api_key));
    }
}
