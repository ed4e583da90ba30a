//! The contract every cacheable asset implements.
//!
//! A concrete resource is created empty from its normalized path by
//! [`Resource::create`], filled by exactly one of the `load*` methods and
//! torn down by [`Resource::unload`] right before the cache drops it. Only the
//! cache calls these; subsystems hold handles and go through the cache.

use std::any::Any;

use crate::error::{ResourceError, Result};
use crate::files::FileSource;
use crate::gpu::GpuContext;
use crate::path::ResourcePath;

/// Collaborators a resource may use while loading or unloading.
///
/// Only [`ResourceCache`](crate::ResourceCache) can build one, so a resource
/// can only be loaded and torn down through the cache.
///
/// ```compile_fail
/// use proton_runtime::{HeadlessGpu, LoadContext, MemoryFiles};
///
/// let files = MemoryFiles::new();
/// let mut gpu = HeadlessGpu::new();
/// let _ctx = LoadContext { files: &files, gpu: &mut gpu };
/// ```
pub struct LoadContext<'a> {
    pub(crate) files: &'a dyn FileSource,
    pub(crate) gpu: &'a mut dyn GpuContext,
}

impl<'a> LoadContext<'a> {
    pub fn files(&self) -> &'a dyn FileSource {
        self.files
    }

    pub fn gpu(&mut self) -> &mut (dyn GpuContext + 'a) {
        &mut *self.gpu
    }
}

pub trait Resource: Any + Send {
    /// Builds an empty, inert instance for `path`.
    fn create(path: &ResourcePath) -> Self
    where
        Self: Sized;

    /// Loads the backing file. Returns the payload size in bytes.
    fn load(&mut self, ctx: &mut LoadContext<'_>, extra: i32) -> Result<u64>;

    /// Loads from a block of memory holding the same encoding as the file.
    fn load_from_memory(&mut self, _ctx: &mut LoadContext<'_>, _data: &[u8]) -> Result<u64> {
        Err(ResourceError::Unsupported {
            type_name: self.type_name(),
            source_kind: "memory",
        })
    }

    /// Loads from already decoded pixel data.
    fn load_from_raw(
        &mut self,
        _ctx: &mut LoadContext<'_>,
        _data: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<u64> {
        Err(ResourceError::Unsupported {
            type_name: self.type_name(),
            source_kind: "raw pixels",
        })
    }

    /// Releases whatever `load*` acquired. Must tolerate repeated calls and
    /// calls on a resource whose load failed.
    fn unload(&mut self, ctx: &mut LoadContext<'_>);

    fn type_name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    /// Kept in its zeroed state after a failed load.
    Failed,
}

/// How an entry entered the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOrigin {
    File,
    Memory,
    /// Runtime-generated pixels; never deduplicated and invisible to lookups.
    Raw,
}

/// Bookkeeping the cache keeps for every resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    path: ResourcePath,
    pub(crate) ref_count: u32,
    pub(crate) locked: bool,
    pub(crate) size: u64,
    pub(crate) status: LoadStatus,
    origin: ResourceOrigin,
}

impl ResourceInfo {
    pub(crate) fn new(path: ResourcePath, origin: ResourceOrigin) -> Self {
        Self {
            path,
            ref_count: 1,
            locked: false,
            size: 0,
            status: LoadStatus::Loaded,
            origin,
        }
    }

    pub fn filename(&self) -> &str {
        self.path.as_str()
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn hash(&self) -> u32 {
        self.path.hash()
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn origin(&self) -> ResourceOrigin {
        self.origin
    }

    pub(crate) fn increment(&mut self) {
        self.ref_count += 1;
    }

    pub(crate) fn matches(&self, path: &ResourcePath) -> bool {
        self.origin != ResourceOrigin::Raw && self.path.hash() == path.hash() && self.path == *path
    }
}
