use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{Handle, ResourceCache, ResourceKey, UnloadOutcome, UsageEntry};
use crate::error::Result;
use crate::resource::{Resource, ResourceInfo};

/// Thread-safe handle to a [`ResourceCache`].
///
/// Every operation takes the cache lock for its whole duration, so bucket
/// scans and reference count updates from different threads never interleave.
/// Loads run their file and GPU work under the lock as well.
#[derive(Debug)]
pub struct SharedResourceCache {
    cache: Arc<Mutex<ResourceCache>>,
}

impl Clone for SharedResourceCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl From<ResourceCache> for SharedResourceCache {
    fn from(cache: ResourceCache) -> Self {
        Self::new(cache)
    }
}

impl SharedResourceCache {
    pub fn new(cache: ResourceCache) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn load<T: Resource>(&self, path: &str, locked: bool, extra: i32) -> Result<Handle<T>> {
        self.cache.lock().load(path, locked, extra)
    }

    pub fn load_from_memory<T: Resource>(&self, name: &str, data: &[u8]) -> Result<Handle<T>> {
        self.cache.lock().load_from_memory(name, data)
    }

    pub fn load_from_raw<T: Resource>(
        &self,
        name: &str,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Handle<T>> {
        self.cache.lock().load_from_raw(name, data, width, height)
    }

    pub fn unload(&self, key: impl Into<ResourceKey>) -> Result<UnloadOutcome> {
        self.cache.lock().unload(key)
    }

    pub fn find(&self, path: &str) -> Option<ResourceKey> {
        self.cache.lock().find(path)
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn count(&self) -> usize {
        self.cache.lock().count()
    }

    pub fn info(&self, key: impl Into<ResourceKey>) -> Option<ResourceInfo> {
        self.cache.lock().info(key).cloned()
    }

    pub fn usage(&self) -> Vec<UsageEntry> {
        self.cache.lock().usage()
    }

    /// Runs `reader` against the resource behind `handle` while holding the
    /// lock.
    pub fn with<T, F, R>(&self, handle: Handle<T>, reader: F) -> Option<R>
    where
        T: Resource,
        F: FnOnce(&T) -> R,
    {
        let guard = self.cache.lock();
        guard.get(handle).map(reader)
    }

    /// Runs `f` with exclusive access to the whole cache.
    pub fn with_cache<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ResourceCache) -> R,
    {
        f(&mut self.cache.lock())
    }
}
