use std::future::Future;

use tokio::sync::Mutex;

/// Cached authentication token for one cluster.
///
/// This is the only mutable state shared between workers hitting the same cluster, so the
/// refresh-and-read sequence is guarded by a single mutex. Holding the lock across the login
/// call gives single-flight semantics: concurrent callers block on the lock and then reuse the
/// token written by whichever caller got there first.
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    inner: Mutex<Option<String>>,
}

impl TokenCache {
    /// Return the cached token, logging in first if no token has been obtained yet.
    pub(crate) async fn get_or_login<F, Fut, E>(&self, login: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let mut guard = self.inner.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        let token = login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Replace a token the engine has rejected.
    ///
    /// `stale` is the token the caller just failed with. If the cache already holds a different
    /// token then another worker has refreshed in the meantime and that token is reused instead
    /// of logging in again. One expiry therefore causes exactly one re-authentication per
    /// cluster, not one per worker.
    pub(crate) async fn refresh<F, Fut, E>(&self, stale: &str, login: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let mut guard = self.inner.lock().await;
        match guard.as_deref() {
            Some(current) if current != stale => Ok(current.to_string()),
            _ => {
                let token = login().await?;
                *guard = Some(token.clone());
                Ok(token)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_login(
        counter: Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<Result<String, ()>> {
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok(format!("token-{n}")))
        }
    }

    #[tokio::test]
    async fn logs_in_once_and_reuses_token() {
        let cache = TokenCache::default();
        let logins = Arc::new(AtomicUsize::new(0));

        let first = cache.get_or_login(counting_login(logins.clone())).await;
        let second = cache.get_or_login(counting_login(logins.clone())).await;

        assert_eq!(first, Ok("token-1".to_string()));
        assert_eq!(second, Ok("token-1".to_string()));
        assert_eq!(logins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_expiry_causes_one_refresh_across_callers() {
        let cache = TokenCache::default();
        let logins = Arc::new(AtomicUsize::new(0));

        let stale = cache
            .get_or_login(counting_login(logins.clone()))
            .await
            .unwrap();

        // Several workers noticing the same stale token refresh it once between them.
        let refreshed_a = cache
            .refresh(&stale, counting_login(logins.clone()))
            .await
            .unwrap();
        let refreshed_b = cache
            .refresh(&stale, counting_login(logins.clone()))
            .await
            .unwrap();

        assert_eq!(refreshed_a, "token-2");
        assert_eq!(refreshed_b, "token-2");
        assert_eq!(logins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_failure_is_propagated() {
        let cache: TokenCache = TokenCache::default();

        let result = cache
            .refresh("gone", || std::future::ready(Err::<String, ()>(())))
            .await;

        assert!(result.is_err());
    }
}
