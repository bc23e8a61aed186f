/// Read-through caching around a fallible async fetch.
///
/// With `Some(cache)`, a cached value for `$key` is returned when present.
/// On a miss the fetch future is awaited, its value queued for a background
/// write with `$ttl` seconds to live, and returned. A failed cache read is
/// logged and falls through to the fetch. With `None` the fetch runs
/// directly.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live in seconds.
/// * `$fetch`: an expression producing a future of `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let url: String = cached!(
///     self.cache.as_ref(),
///     CacheKey::Poster(movie_id),
///     POSTER_CACHE_TTL,
///     self.fetch_uncached(movie_id)
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $fetch:expr) => {{
        let key = $key;
        match $cache {
            Some(cache) => match cache.get_from_cache(&key).await {
                Ok(Some(hit)) => Ok(hit),
                Ok(None) => match $fetch.await {
                    Ok(value) => {
                        cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                },
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, fetching directly");
                    $fetch.await
                }
            },
            None => $fetch.await,
        }
    }};
}
