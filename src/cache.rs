//! The resource cache every asset-owning subsystem loads through.
//!
//! Entries live in a slot map and are addressed by generation-checked keys,
//! so a handle that outlived its resource is reported instead of dereferenced.
//! A fixed table of [`BUCKET_COUNT`] buckets indexes the keys by identity
//! hash; lookups compare the hash first and then the normalized path.
//!
//! Reference counting follows the engine's usual contract: every successful
//! `load*` call must be balanced by one [`ResourceCache::unload`]. The last
//! unload tears the resource down unless it is locked. [`ResourceCache::clear`]
//! tears everything down, locked or not.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use log::{debug, info, trace, warn};
use slotmap::{new_key_type, SlotMap};

use crate::config::{CacheConfig, FailurePolicy};
use crate::error::{ResourceError, Result};
use crate::files::FileSource;
use crate::gpu::GpuContext;
use crate::path::ResourcePath;
use crate::resource::{
    short_type_name, LoadContext, LoadStatus, Resource, ResourceInfo, ResourceOrigin,
};

pub const BUCKET_COUNT: usize = 64;

new_key_type! {
    /// Untyped handle to a cache entry.
    pub struct ResourceKey;
}

/// Typed handle returned by the cache loaders.
pub struct Handle<T> {
    key: ResourceKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(key: ResourceKey) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.key).finish()
    }
}

impl<T> From<Handle<T>> for ResourceKey {
    fn from(handle: Handle<T>) -> Self {
        handle.key
    }
}

/// Result of a successful [`ResourceCache::unload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadOutcome {
    /// Other references remain.
    Released { remaining: u32 },
    /// Last reference released but the resource is locked.
    Retained,
    /// The resource was unloaded and removed.
    Destroyed,
}

/// One row of the diagnostic usage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEntry {
    pub bucket: usize,
    pub path: String,
    pub hash: u32,
    pub ref_count: u32,
    pub locked: bool,
    pub size: u64,
    pub type_name: &'static str,
    pub status: LoadStatus,
}

struct Entry {
    info: ResourceInfo,
    resource: Box<dyn Resource>,
}

pub struct ResourceCache {
    config: CacheConfig,
    files: Box<dyn FileSource>,
    gpu: Box<dyn GpuContext>,
    entries: SlotMap<ResourceKey, Entry>,
    buckets: [Vec<ResourceKey>; BUCKET_COUNT],
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("config", &self.config)
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

fn bucket_index(hash: u32) -> usize {
    hash as usize % BUCKET_COUNT
}

impl ResourceCache {
    pub fn new(files: impl FileSource + 'static, gpu: impl GpuContext + 'static) -> Self {
        Self {
            config: CacheConfig::default(),
            files: Box::new(files),
            gpu: Box::new(gpu),
            entries: SlotMap::with_key(),
            buckets: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn files(&self) -> &dyn FileSource {
        self.files.as_ref()
    }

    /// Loads `path` as a `T`, or returns the cached entry with its reference
    /// count bumped. `locked` only applies when the resource is created.
    pub fn load<T: Resource>(&mut self, path: &str, locked: bool, extra: i32) -> Result<Handle<T>> {
        let path = ResourcePath::new(path, self.config.max_filename_len)?;
        if let Some(key) = self.lookup(&path) {
            return self.acquire(key);
        }
        self.create(path, ResourceOrigin::File, locked, |resource: &mut T, ctx| {
            resource.load(ctx, extra)
        })
    }

    /// Like [`ResourceCache::load`] for assets without a backing file; `name`
    /// is the cache key.
    pub fn load_from_memory<T: Resource>(&mut self, name: &str, data: &[u8]) -> Result<Handle<T>> {
        let path = ResourcePath::new(name, self.config.max_filename_len)?;
        if let Some(key) = self.lookup(&path) {
            return self.acquire(key);
        }
        self.create(path, ResourceOrigin::Memory, false, |resource: &mut T, ctx| {
            resource.load_from_memory(ctx, data)
        })
    }

    /// Always creates a new resource from decoded pixels. Entries created here
    /// are never returned by [`ResourceCache::find`] or shared with the other
    /// loaders, even when another entry has the same name; callers keep their
    /// own handles.
    pub fn load_from_raw<T: Resource>(
        &mut self,
        name: &str,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Handle<T>> {
        let path = ResourcePath::new(name, self.config.max_filename_len)?;
        self.create(path, ResourceOrigin::Raw, false, |resource: &mut T, ctx| {
            resource.load_from_raw(ctx, data, width, height)
        })
    }

    /// Releases one reference to the resource behind `key`.
    pub fn unload(&mut self, key: impl Into<ResourceKey>) -> Result<UnloadOutcome> {
        let key = key.into();
        let Some(entry) = self.entries.get_mut(key) else {
            warn!("unload of unknown resource handle {key:?}");
            return Err(ResourceError::UnknownResource);
        };

        if entry.info.ref_count > 1 {
            entry.info.ref_count -= 1;
            trace!(
                "released {} ({} references left)",
                entry.info.filename(),
                entry.info.ref_count
            );
            return Ok(UnloadOutcome::Released {
                remaining: entry.info.ref_count,
            });
        }

        if entry.info.locked {
            trace!("retained locked resource {}", entry.info.filename());
            return Ok(UnloadOutcome::Retained);
        }

        self.destroy(key);
        Ok(UnloadOutcome::Destroyed)
    }

    /// Returns the cached entry for `path`, if any. Invalid paths simply find
    /// nothing.
    pub fn find(&self, path: &str) -> Option<ResourceKey> {
        let path = ResourcePath::new(path, self.config.max_filename_len).ok()?;
        self.lookup(&path)
    }

    /// Typed variant of [`ResourceCache::find`]; `None` if the entry exists
    /// but holds another type.
    pub fn find_as<T: Resource>(&self, path: &str) -> Option<Handle<T>> {
        self.find(path).and_then(|key| self.downcast(key))
    }

    /// Unloads and removes every resource, including locked ones.
    pub fn clear(&mut self) {
        let count = self.count();
        for bucket in self.buckets.iter_mut() {
            for key in bucket.drain(..) {
                if let Some(mut entry) = self.entries.remove(key) {
                    let mut ctx = LoadContext {
                        files: self.files.as_ref(),
                        gpu: self.gpu.as_mut(),
                    };
                    entry.resource.unload(&mut ctx);
                }
            }
        }
        self.entries.clear();
        if count > 0 {
            debug!("cleared {count} resource(s)");
        }
    }

    pub fn count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Sets or clears the lock flag of a live resource.
    pub fn lock(&mut self, key: impl Into<ResourceKey>, locked: bool) -> Result<()> {
        let entry = self
            .entries
            .get_mut(key.into())
            .ok_or(ResourceError::UnknownResource)?;
        entry.info.locked = locked;
        Ok(())
    }

    pub fn contains(&self, key: impl Into<ResourceKey>) -> bool {
        self.entries.contains_key(key.into())
    }

    pub fn info(&self, key: impl Into<ResourceKey>) -> Option<&ResourceInfo> {
        self.entries.get(key.into()).map(|entry| &entry.info)
    }

    pub fn get<T: Resource>(&self, handle: Handle<T>) -> Option<&T> {
        self.entries
            .get(handle.key)?
            .resource
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn get_mut<T: Resource>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.entries
            .get_mut(handle.key)?
            .resource
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Turns an untyped key into a typed handle if the entry holds a `T`.
    pub fn downcast<T: Resource>(&self, key: ResourceKey) -> Option<Handle<T>> {
        let entry = self.entries.get(key)?;
        entry
            .resource
            .as_any()
            .is::<T>()
            .then(|| Handle::new(key))
    }

    /// Snapshot of every entry, in bucket order.
    pub fn usage(&self) -> Vec<UsageEntry> {
        self.buckets
            .iter()
            .enumerate()
            .flat_map(|(bucket, keys)| keys.iter().map(move |key| (bucket, *key)))
            .filter_map(|(bucket, key)| {
                let entry = self.entries.get(key)?;
                Some(UsageEntry {
                    bucket,
                    path: entry.info.filename().to_string(),
                    hash: entry.info.hash(),
                    ref_count: entry.info.ref_count(),
                    locked: entry.info.is_locked(),
                    size: entry.info.size(),
                    type_name: entry.resource.type_name(),
                    status: entry.info.status(),
                })
            })
            .collect()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|entry| entry.info.size()).sum()
    }

    /// Logs the usage table.
    pub fn display_usage(&self) {
        info!("Resource usage:");
        for entry in self.usage() {
            info!(
                " [{:02}] {:08x} {} ({}) refs={} locked={} size={}",
                entry.bucket,
                entry.hash,
                entry.path,
                entry.type_name,
                entry.ref_count,
                entry.locked,
                entry.size
            );
        }
        info!(
            "{} resource(s), {} byte(s)",
            self.count(),
            self.total_size()
        );
    }

    fn lookup(&self, path: &ResourcePath) -> Option<ResourceKey> {
        self.buckets[bucket_index(path.hash())]
            .iter()
            .copied()
            .find(|key| {
                self.entries
                    .get(*key)
                    .is_some_and(|entry| entry.info.matches(path))
            })
    }

    fn acquire<T: Resource>(&mut self, key: ResourceKey) -> Result<Handle<T>> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or(ResourceError::UnknownResource)?;
        if !entry.resource.as_any().is::<T>() {
            return Err(ResourceError::TypeMismatch {
                path: entry.info.filename().to_string(),
                cached: entry.resource.type_name(),
                requested: short_type_name::<T>(),
            });
        }
        entry.info.increment();
        trace!(
            "cache hit for {} ({} references)",
            entry.info.filename(),
            entry.info.ref_count()
        );
        Ok(Handle::new(key))
    }

    fn create<T, F>(
        &mut self,
        path: ResourcePath,
        origin: ResourceOrigin,
        locked: bool,
        load: F,
    ) -> Result<Handle<T>>
    where
        T: Resource,
        F: FnOnce(&mut T, &mut LoadContext<'_>) -> Result<u64>,
    {
        let mut resource = T::create(&path);
        let mut info = ResourceInfo::new(path, origin);
        let mut ctx = LoadContext {
            files: self.files.as_ref(),
            gpu: self.gpu.as_mut(),
        };

        match load(&mut resource, &mut ctx) {
            Ok(size) => info.size = size,
            Err(err) => {
                resource.unload(&mut ctx);
                match self.config.failure_policy {
                    FailurePolicy::Strict => {
                        warn!("failed to load {}: {err}", info.filename());
                        return Err(err);
                    }
                    FailurePolicy::KeepInert => {
                        warn!("failed to load {}, keeping it inert: {err}", info.filename());
                        info.status = LoadStatus::Failed;
                    }
                }
            }
        }

        info.locked = locked;
        let bucket = bucket_index(info.hash());
        debug!(
            "loaded {} into bucket {bucket} ({} bytes{})",
            info.filename(),
            info.size(),
            if locked { ", locked" } else { "" }
        );
        let key = self.entries.insert(Entry {
            info,
            resource: Box::new(resource),
        });
        self.buckets[bucket].push(key);
        Ok(Handle::new(key))
    }

    fn destroy(&mut self, key: ResourceKey) {
        let Some(mut entry) = self.entries.remove(key) else {
            return;
        };
        self.buckets[bucket_index(entry.info.hash())].retain(|candidate| *candidate != key);
        let mut ctx = LoadContext {
            files: self.files.as_ref(),
            gpu: self.gpu.as_mut(),
        };
        entry.resource.unload(&mut ctx);
        debug!("destroyed {}", entry.info.filename());
    }
}

impl Drop for ResourceCache {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MemoryFiles;
    use crate::gpu::{HeadlessGpu, TextureId};
    use crate::path::identity_hash;
    use std::any::Any;

    /// Minimal GPU-backed resource: one handle per successful load.
    #[derive(Default)]
    struct Blob {
        name: String,
        bytes: Vec<u8>,
        handle: Option<TextureId>,
    }

    impl Resource for Blob {
        fn create(path: &ResourcePath) -> Self {
            Blob {
                name: path.to_string(),
                ..Blob::default()
            }
        }

        fn load(&mut self, ctx: &mut LoadContext<'_>, extra: i32) -> Result<u64> {
            self.handle = Some(ctx.gpu().allocate_texture()?);
            if extra < 0 {
                return Err(ResourceError::corrupt(&self.name, "negative extra"));
            }
            self.bytes = ctx.files().read(&self.name)?;
            Ok(self.bytes.len() as u64)
        }

        fn load_from_memory(&mut self, ctx: &mut LoadContext<'_>, data: &[u8]) -> Result<u64> {
            self.handle = Some(ctx.gpu().allocate_texture()?);
            self.bytes = data.to_vec();
            Ok(self.bytes.len() as u64)
        }

        fn load_from_raw(
            &mut self,
            ctx: &mut LoadContext<'_>,
            data: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<u64> {
            self.load_from_memory(ctx, data)
        }

        fn unload(&mut self, ctx: &mut LoadContext<'_>) {
            if let Some(handle) = self.handle.take() {
                ctx.gpu().free_texture(handle);
            }
            self.bytes.clear();
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Other;

    impl Resource for Other {
        fn create(_path: &ResourcePath) -> Self {
            Other
        }

        fn load(&mut self, _ctx: &mut LoadContext<'_>, _extra: i32) -> Result<u64> {
            Ok(0)
        }

        fn unload(&mut self, _ctx: &mut LoadContext<'_>) {}

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn cache_with(files: &[&str]) -> (ResourceCache, HeadlessGpu) {
        let mut source = MemoryFiles::new();
        for name in files {
            source.insert(name, name.as_bytes().to_vec());
        }
        let gpu = HeadlessGpu::new();
        (ResourceCache::new(source, gpu.clone()), gpu)
    }

    #[test]
    fn repeated_load_shares_one_entry() {
        let (mut cache, gpu) = cache_with(&["a.png"]);
        let first = cache.load::<Blob>("a.png", false, 0).unwrap();
        assert_eq!(cache.info(first).unwrap().ref_count(), 1);
        let second = cache.load::<Blob>("a.png", false, 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.info(first).unwrap().ref_count(), 2);
        assert_eq!(cache.count(), 1);
        assert_eq!(gpu.live_textures(), 1);
    }

    #[test]
    fn unload_counts_down_then_destroys() {
        let (mut cache, gpu) = cache_with(&["a.png"]);
        let handle = cache.load::<Blob>("a.png", false, 0).unwrap();
        cache.load::<Blob>("a.png", false, 0).unwrap();

        assert_eq!(
            cache.unload(handle).unwrap(),
            UnloadOutcome::Released { remaining: 1 }
        );
        assert_eq!(cache.find("a.png"), Some(handle.key()));

        assert_eq!(cache.unload(handle).unwrap(), UnloadOutcome::Destroyed);
        assert_eq!(cache.find("a.png"), None);
        assert_eq!(cache.count(), 0);
        assert_eq!(gpu.live_textures(), 0);
    }

    #[test]
    fn double_unload_is_reported() {
        let (mut cache, _gpu) = cache_with(&["a.png"]);
        let handle = cache.load::<Blob>("a.png", false, 0).unwrap();
        cache.unload(handle).unwrap();
        assert_eq!(cache.unload(handle), Err(ResourceError::UnknownResource));
        assert!(cache.get(handle).is_none());
    }

    #[test]
    fn locked_resource_survives_unload_until_clear() {
        let (mut cache, gpu) = cache_with(&["b.png"]);
        let handle = cache.load::<Blob>("b.png", true, 0).unwrap();
        assert_eq!(cache.unload(handle).unwrap(), UnloadOutcome::Retained);
        assert_eq!(cache.info(handle).unwrap().ref_count(), 1);
        assert!(cache.find("b.png").is_some());

        cache.clear();
        assert_eq!(cache.count(), 0);
        assert!(!cache.contains(handle));
        assert_eq!(gpu.live_textures(), 0);
    }

    #[test]
    fn unlocking_allows_teardown() {
        let (mut cache, _gpu) = cache_with(&["b.png"]);
        let handle = cache.load::<Blob>("b.png", true, 0).unwrap();
        cache.lock(handle, false).unwrap();
        assert_eq!(cache.unload(handle).unwrap(), UnloadOutcome::Destroyed);
    }

    #[test]
    fn lock_flag_only_applies_on_creation() {
        let (mut cache, _gpu) = cache_with(&["c.png"]);
        let handle = cache.load::<Blob>("c.png", false, 0).unwrap();
        cache.load::<Blob>("c.png", true, 0).unwrap();
        assert!(!cache.info(handle).unwrap().is_locked());
    }

    #[test]
    fn normalized_paths_share_an_entry() {
        let (mut cache, _gpu) = cache_with(&["data/tex.png"]);
        let a = cache.load::<Blob>("Data/Tex.PNG", false, 0).unwrap();
        let b = cache.load::<Blob>("data\\tex.png", false, 0).unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.info(a).unwrap().filename(), "data/tex.png");
    }

    #[test]
    fn raw_loads_never_deduplicate() {
        let (mut cache, gpu) = cache_with(&[]);
        let pixels = [0u8; 1024];
        let a = cache.load_from_raw::<Blob>("frame", &pixels, 16, 16).unwrap();
        let b = cache.load_from_raw::<Blob>("frame", &pixels, 16, 16).unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.count(), 2);
        assert_eq!(cache.find("frame"), None);
        assert_eq!(gpu.live_textures(), 2);
    }

    #[test]
    fn memory_loads_deduplicate_by_name() {
        let (mut cache, _gpu) = cache_with(&[]);
        let a = cache.load_from_memory::<Blob>("builtin/font", b"glyphs").unwrap();
        let b = cache.load_from_memory::<Blob>("BUILTIN\\Font", b"ignored").unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.get(a).unwrap().bytes, b"glyphs");
        assert_eq!(cache.info(a).unwrap().size(), 6);
        assert_eq!(cache.info(a).unwrap().origin(), ResourceOrigin::Memory);
    }

    #[test]
    fn strict_failure_leaves_no_entry() {
        let (mut cache, gpu) = cache_with(&["bad.png"]);
        let result = cache.load::<Blob>("bad.png", false, -1);
        assert!(matches!(result, Err(ResourceError::HeaderCorrupt { .. })));
        assert_eq!(cache.count(), 0);
        assert_eq!(gpu.live_textures(), 0);

        assert_eq!(
            cache.load::<Blob>("missing.png", false, 0).unwrap_err(),
            ResourceError::FileNotFound("missing.png".into())
        );
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn keep_inert_policy_inserts_failed_entry() {
        let (cache, gpu) = cache_with(&[]);
        let mut cache = cache.with_config(
            CacheConfig::default().with_failure_policy(FailurePolicy::KeepInert),
        );
        let handle = cache.load::<Blob>("missing.png", false, 0).unwrap();
        let info = cache.info(handle).unwrap();
        assert_eq!(info.status(), LoadStatus::Failed);
        assert_eq!(info.size(), 0);
        assert!(cache.get(handle).unwrap().handle.is_none());
        assert_eq!(gpu.live_textures(), 0);
    }

    #[test]
    fn type_mismatch_is_reported() {
        let (mut cache, _gpu) = cache_with(&["a.png"]);
        let handle = cache.load::<Blob>("a.png", false, 0).unwrap();
        assert!(matches!(
            cache.load::<Other>("a.png", false, 0),
            Err(ResourceError::TypeMismatch { .. })
        ));
        assert_eq!(cache.info(handle).unwrap().ref_count(), 1);
        assert!(cache.find_as::<Other>("a.png").is_none());
        assert_eq!(cache.find_as::<Blob>("a.png"), Some(handle));
    }

    #[test]
    fn invalid_paths() {
        let (mut cache, _gpu) = cache_with(&[]);
        assert!(matches!(
            cache.load::<Blob>("", false, 0),
            Err(ResourceError::PathInvalid { .. })
        ));
        assert_eq!(cache.find(""), None);
        assert_eq!(cache.find("missing.png"), None);
    }

    #[test]
    fn count_matches_distinct_paths() {
        let names: Vec<String> = (0..200).map(|i| format!("tex/{i}.png")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (mut cache, _gpu) = cache_with(&refs);
        for name in &refs {
            cache.load::<Blob>(name, false, 0).unwrap();
        }
        assert_eq!(cache.count(), 200);
        assert_eq!(cache.usage().len(), 200);
        for name in &refs {
            assert!(cache.find(name).is_some());
        }
    }

    #[test]
    fn colliding_paths_share_a_bucket() {
        let (first, second) = ("t/122789.prtx", "t/339192.prtx");
        assert_eq!(identity_hash(first), identity_hash(second));

        let (mut cache, _gpu) = cache_with(&[first, second]);
        let a = cache.load::<Blob>(first, false, 0).unwrap();
        let b = cache.load::<Blob>(second, false, 0).unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.count(), 2);
        assert_eq!(cache.info(a).unwrap().ref_count(), 1);
        assert_eq!(cache.info(b).unwrap().ref_count(), 1);

        assert_eq!(cache.unload(a).unwrap(), UnloadOutcome::Destroyed);
        assert_eq!(cache.find(first), None);
        assert_eq!(cache.find(second), Some(b.key()));
    }

    #[test]
    fn clear_ignores_reference_counts() {
        let (mut cache, gpu) = cache_with(&["a.png", "b.png"]);
        cache.load::<Blob>("a.png", false, 0).unwrap();
        cache.load::<Blob>("a.png", false, 0).unwrap();
        cache.load::<Blob>("b.png", true, 0).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(gpu.live_textures(), 0);
        assert_eq!(gpu.freed_textures(), 2);
    }

    #[test]
    fn drop_releases_gpu_handles() {
        let (mut cache, gpu) = cache_with(&["a.png"]);
        cache.load::<Blob>("a.png", true, 0).unwrap();
        drop(cache);
        assert_eq!(gpu.live_textures(), 0);
    }

    #[test]
    fn usage_reports_entries() {
        let (mut cache, _gpu) = cache_with(&["a.png"]);
        let handle = cache.load::<Blob>("a.png", true, 0).unwrap();
        let usage = cache.usage();
        assert_eq!(usage.len(), 1);
        let row = &usage[0];
        assert_eq!(row.path, "a.png");
        assert_eq!(row.type_name, "Blob");
        assert_eq!(row.hash, cache.info(handle).unwrap().hash());
        assert_eq!(row.bucket, row.hash as usize % BUCKET_COUNT);
        assert!(row.locked);
        assert_eq!(row.size, 5);
        assert_eq!(cache.total_size(), 5);
        cache.display_usage();
    }
}
