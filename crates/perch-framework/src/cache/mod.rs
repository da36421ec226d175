//! Bounded LRU caches used by the dispatcher and the runtime.
//!
//! Both caches treat a capacity of zero as "disabled": nothing is stored and
//! every lookup misses.

pub mod response;
pub mod user_info;

pub use response::{MessageKey, ResponseCache};
pub use user_info::UserInfoCache;

use std::num::NonZeroUsize;

use lru::LruCache;

pub(crate) fn bounded<K, V>(capacity: usize) -> Option<LruCache<K, V>>
where
    K: std::hash::Hash + Eq,
{
    NonZeroUsize::new(capacity).map(LruCache::new)
}
