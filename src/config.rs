use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the movie catalog JSON file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the movie embeddings JSON file
    #[serde(default = "default_embeddings_path")]
    pub embeddings_path: String,

    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Base URL poster paths are appended to
    #[serde(default = "default_poster_base_url")]
    pub poster_base_url: String,

    /// Image URL returned when a poster cannot be fetched
    #[serde(default = "default_poster_placeholder_url")]
    pub poster_placeholder_url: String,

    /// Per-poster fetch timeout in milliseconds
    #[serde(default = "default_poster_timeout_ms")]
    pub poster_timeout_ms: u64,

    /// Redis connection URL; poster caching is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Number of recommendations returned when `k` is omitted
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Upper bound for `k`
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Compute the similarity matrix at startup instead of on first request
    #[serde(default)]
    pub prewarm_similarity: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_path() -> String {
    "data/movies.json".to_string()
}

fn default_embeddings_path() -> String {
    "data/movie_embeddings.json".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_poster_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_poster_placeholder_url() -> String {
    "https://placehold.co/500x750?text=No+Poster".to_string()
}

fn default_poster_timeout_ms() -> u64 {
    3000
}

fn default_k() -> usize {
    5
}

fn default_max_k() -> usize {
    20
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the recommendation count bounds are consistent
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_k == 0 {
            anyhow::bail!("MAX_K must be at least 1");
        }
        if self.default_k == 0 || self.default_k > self.max_k {
            anyhow::bail!(
                "DEFAULT_K must be between 1 and MAX_K ({}), got {}",
                self.max_k,
                self.default_k
            );
        }
        Ok(())
    }
}
