//! User identity cache.
//!
//! Wraps a [`UserInfoFinder`] with a bounded LRU so repeated lookups of the
//! same user do not hit the platform. Entries are filled lazily on a miss and
//! never invalidated within a session.

use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use perch_core::{ApiResult, BoxedUserInfoFinder, UserInfo, UserInfoFinder};

use super::bounded;

/// A caching [`UserInfoFinder`].
///
/// A capacity of zero disables caching: every lookup goes to the wrapped
/// finder. The lock is never held across the wrapped finder's await point.
pub struct UserInfoCache {
    finder: BoxedUserInfoFinder,
    entries: Option<Mutex<LruCache<String, UserInfo>>>,
}

impl UserInfoCache {
    /// Wraps `finder` with a cache of `capacity` users.
    pub fn new(finder: BoxedUserInfoFinder, capacity: usize) -> Self {
        Self {
            finder,
            entries: bounded(capacity).map(Mutex::new),
        }
    }

    /// Wraps `finder` and returns the cache ready to be shared.
    pub fn shared(finder: BoxedUserInfoFinder, capacity: usize) -> Arc<Self> {
        Arc::new(Self::new(finder, capacity))
    }

    /// Returns `true` unless the capacity is zero.
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Returns the number of cached users.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.lock().len())
    }

    /// Returns `true` if no user is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserInfoFinder for UserInfoCache {
    async fn user_info(&self, user_id: &str) -> ApiResult<UserInfo> {
        let Some(entries) = &self.entries else {
            return self.finder.user_info(user_id).await;
        };

        let cached = entries.lock().get(user_id).cloned();
        if let Some(hit) = cached {
            trace!(user = user_id, "User info cache hit");
            return Ok(hit);
        }

        let info = self.finder.user_info(user_id).await?;
        entries.lock().put(user_id.to_string(), info.clone());
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perch_core::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFinder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UserInfoFinder for CountingFinder {
        async fn user_info(&self, user_id: &str) -> ApiResult<UserInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if user_id == "missing" {
                return Err(ApiError::UserNotFound(user_id.to_string()));
            }
            Ok(UserInfo {
                id: user_id.to_string(),
                name: format!("name-{user_id}"),
                real_name: None,
            })
        }
    }

    #[tokio::test]
    async fn test_hits_skip_the_finder() {
        let finder = Arc::new(CountingFinder::default());
        let cache = UserInfoCache::new(finder.clone(), 2);

        assert_eq!(cache.user_info("U1").await.unwrap().name, "name-U1");
        assert_eq!(cache.user_info("U1").await.unwrap().name, "name-U1");
        assert_eq!(finder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_asks_the_finder() {
        let finder = Arc::new(CountingFinder::default());
        let cache = UserInfoCache::new(finder.clone(), 0);

        cache.user_info("U1").await.unwrap();
        cache.user_info("U1").await.unwrap();
        assert!(!cache.is_enabled());
        assert_eq!(finder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let finder = Arc::new(CountingFinder::default());
        let cache = UserInfoCache::new(finder.clone(), 2);

        assert!(cache.user_info("missing").await.is_err());
        assert!(cache.user_info("missing").await.is_err());
        assert_eq!(finder.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_eviction_refetches() {
        let finder = Arc::new(CountingFinder::default());
        let cache = UserInfoCache::new(finder.clone(), 1);

        cache.user_info("U1").await.unwrap();
        cache.user_info("U2").await.unwrap();
        cache.user_info("U1").await.unwrap();
        assert_eq!(finder.calls.load(Ordering::SeqCst), 3);
    }
}
