use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::SinkError;

/// External list store addressed by key, with Redis list semantics.
///
/// Implementations are shared between loggers (and possibly processes);
/// they must make [`push_capped`](ListStore::push_capped) a single atomic
/// step on their side. No locking is added on top.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Append `value` to the tail of `key`, then keep only the newest
    /// `cap` entries.
    async fn push_capped(&self, key: &str, value: &str, cap: usize) -> Result<(), SinkError>;

    /// Entries from `start` to `stop` inclusive. Negative indexes count
    /// from the tail, so `range(key, 0, -1)` reads the whole list.
    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, SinkError>;

    async fn len(&self, key: &str) -> Result<usize, SinkError>;

    /// Remove and return the oldest entry.
    async fn pop_front(&self, key: &str) -> Result<Option<String>, SinkError>;

    /// Remove and return the newest entry.
    async fn pop_back(&self, key: &str) -> Result<Option<String>, SinkError>;

    async fn del(&self, key: &str) -> Result<(), SinkError>;
}

/// In-process [`ListStore`]. Clones share the same lists, which lets
/// several loggers write to one queue the way they would with Redis.
#[derive(Clone, Default)]
pub struct MemoryListStore {
    lists: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListStore for MemoryListStore {
    async fn push_capped(&self, key: &str, value: &str, cap: usize) -> Result<(), SinkError> {
        let mut lists = self.lists.lock().await;
        let list = lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());
        while list.len() > cap {
            list.pop_front();
        }
        if list.is_empty() {
            lists.remove(key);
        }
        Ok(())
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, SinkError> {
        let lists = self.lists.lock().await;
        let Some(list) = lists.get(key) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn len(&self, key: &str) -> Result<usize, SinkError> {
        Ok(self.lists.lock().await.get(key).map_or(0, VecDeque::len))
    }

    async fn pop_front(&self, key: &str) -> Result<Option<String>, SinkError> {
        Ok(self
            .lists
            .lock()
            .await
            .get_mut(key)
            .and_then(VecDeque::pop_front))
    }

    async fn pop_back(&self, key: &str) -> Result<Option<String>, SinkError> {
        Ok(self
            .lists
            .lock()
            .await
            .get_mut(key)
            .and_then(VecDeque::pop_back))
    }

    async fn del(&self, key: &str) -> Result<(), SinkError> {
        self.lists.lock().await.remove(key);
        Ok(())
    }
}

/// Turn Redis-style inclusive indexes into a valid `from..=to` window,
/// or `None` when the window is empty.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = isize::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_range() {
        assert_eq!(resolve_range(5, 0, -1), Some((0, 4)));
        assert_eq!(resolve_range(5, -2, -1), Some((3, 4)));
        assert_eq!(resolve_range(5, 1, 100), Some((1, 4)));
        assert_eq!(resolve_range(5, -100, 1), Some((0, 1)));
        assert_eq!(resolve_range(5, 3, 1), None);
        assert_eq!(resolve_range(0, 0, -1), None);
        assert_eq!(resolve_range(2, 0, -3), None);
    }

    #[tokio::test]
    async fn test_push_capped_keeps_newest() {
        let store = MemoryListStore::new();
        for value in ["a", "b", "c", "d"] {
            store.push_capped("q", value, 3).await.unwrap();
        }
        assert_eq!(store.len("q").await.unwrap(), 3);
        assert_eq!(store.range("q", 0, -1).await.unwrap(), ["b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_clones_share_lists() {
        let store = MemoryListStore::new();
        let other = store.clone();
        store.push_capped("q", "a", 10).await.unwrap();
        other.push_capped("q", "b", 10).await.unwrap();

        assert_eq!(store.pop_front("q").await.unwrap().as_deref(), Some("a"));
        assert_eq!(other.pop_back("q").await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.pop_back("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_del_and_missing_keys() {
        let store = MemoryListStore::new();
        store.push_capped("q", "a", 10).await.unwrap();
        store.del("q").await.unwrap();
        assert_eq!(store.len("q").await.unwrap(), 0);
        assert!(store.range("missing", 0, -1).await.unwrap().is_empty());
        assert_eq!(store.pop_front("missing").await.unwrap(), None);
    }
}
