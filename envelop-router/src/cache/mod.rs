use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

pub(crate) trait KeyType: Clone + fmt::Debug + Hash + Eq + Send + Sync {}
pub(crate) trait ValueType: Clone + fmt::Debug + Send + Sync {}

impl<K> KeyType for K where K: Clone + fmt::Debug + Hash + Eq + Send + Sync {}

impl<V> ValueType for V where V: Clone + fmt::Debug + Send + Sync {}

/// In-memory cache shared between requests.
///
/// Unbounded unless a capacity is given, in which case the least recently used entry is evicted
/// first. Cloning shares the underlying storage.
#[derive(Clone)]
pub(crate) struct CacheStorage<K: KeyType, V: ValueType> {
    inner: Arc<Mutex<LruCache<K, V>>>,
}

impl<K, V> CacheStorage<K, V>
where
    K: KeyType,
    V: ValueType,
{
    pub(crate) fn new(max_capacity: Option<NonZeroUsize>) -> Self {
        let cache = match max_capacity {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    pub(crate) fn insert(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

impl<K: KeyType, V: ValueType> fmt::Debug for CacheStorage<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStorage")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
