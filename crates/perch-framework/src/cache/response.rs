//! Response correlation store.
//!
//! Maps an incoming message `(channel, timestamp)` to the ordered list of
//! replies the runtime posted for it, so later edits and deletions of that
//! message can be mirrored onto the replies.

use std::fmt;

use lru::LruCache;
use perch_core::{ReplyRecord, Timestamp};

use super::bounded;

/// Identifies an incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey {
    /// Channel the message was posted in.
    pub channel: String,
    /// Platform timestamp of the message.
    pub timestamp: Timestamp,
}

impl MessageKey {
    /// Creates a key.
    pub fn new(channel: impl Into<String>, timestamp: impl Into<Timestamp>) -> Self {
        Self {
            channel: channel.into(),
            timestamp: timestamp.into(),
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.timestamp)
    }
}

/// LRU store of the replies produced for recent incoming messages.
///
/// A capacity of zero disables the store entirely.
pub struct ResponseCache {
    capacity: usize,
    entries: Option<LruCache<MessageKey, Vec<ReplyRecord>>>,
}

impl ResponseCache {
    /// Creates a store holding at most `capacity` incoming messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: bounded(capacity),
        }
    }

    /// Returns `true` unless the capacity is zero.
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of tracked incoming messages.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the replies recorded for `key`, marking it as
    /// recently used.
    pub fn get(&mut self, key: &MessageKey) -> Option<Vec<ReplyRecord>> {
        self.entries.as_mut()?.get(key).cloned()
    }

    /// Records the replies for `key`, evicting the least recently used entry
    /// when full. An empty list removes the entry.
    pub fn put(&mut self, key: MessageKey, replies: Vec<ReplyRecord>) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        if replies.is_empty() {
            entries.pop(&key);
        } else {
            entries.put(key, replies);
        }
    }

    /// Forgets `key`, returning its replies.
    pub fn remove(&mut self, key: &MessageKey) -> Option<Vec<ReplyRecord>> {
        self.entries.as_mut()?.pop(key)
    }
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(ts: &str) -> ReplyRecord {
        ReplyRecord {
            channel: "Cgeneral".to_string(),
            timestamp: Timestamp::from(ts),
            text: "hi".to_string(),
        }
    }

    #[test]
    fn test_disabled_store_keeps_nothing() {
        let mut cache = ResponseCache::new(0);
        let key = MessageKey::new("Cgeneral", "1.0");
        cache.put(key.clone(), vec![reply("2.0")]);
        assert!(!cache.is_enabled());
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_least_recently_used_entry_is_evicted() {
        let mut cache = ResponseCache::new(2);
        let (a, b, c) = (
            MessageKey::new("C", "1.0"),
            MessageKey::new("C", "2.0"),
            MessageKey::new("C", "3.0"),
        );
        cache.put(a.clone(), vec![reply("10.0")]);
        cache.put(b.clone(), vec![reply("20.0")]);
        assert!(cache.get(&a).is_some());
        cache.put(c.clone(), vec![reply("30.0")]);

        assert!(cache.get(&b).is_none());
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&c).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_empty_put_removes_entry() {
        let mut cache = ResponseCache::new(4);
        let key = MessageKey::new("C", "1.0");
        cache.put(key.clone(), vec![reply("2.0")]);
        cache.put(key.clone(), Vec::new());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_same_timestamp_in_other_channel_is_distinct() {
        let mut cache = ResponseCache::new(4);
        cache.put(MessageKey::new("C1", "1.0"), vec![reply("2.0")]);
        assert!(cache.get(&MessageKey::new("C2", "1.0")).is_none());
        assert_eq!(cache.remove(&MessageKey::new("C1", "1.0")).map(|r| r.len()), Some(1));
    }
}
