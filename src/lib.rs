//! Resource cache and texture lifecycle for the Proton engine, rewritten in
//! Rust.
//!
//! Subsystems such as sprite, font and background loaders request assets
//! from a [`ResourceCache`], which deduplicates them by normalized path,
//! counts references and tears them down through their [`Resource`]
//! implementation. File access and graphics calls reach resources only
//! through the [`FileSource`] and [`GpuContext`] traits, so the crate runs
//! headless in tools and tests.

pub mod archive;
pub mod cache;
pub mod config;
pub mod error;
pub mod files;
pub mod gpu;
pub mod path;
pub mod resource;
pub mod shared;
pub mod texture;

pub use archive::{build_archive, ArchiveFileEntry, AssetArchive};
pub use cache::{Handle, ResourceCache, ResourceKey, UnloadOutcome, UsageEntry, BUCKET_COUNT};
pub use config::{CacheConfig, FailurePolicy};
pub use error::ResourceError;
pub use files::{DiskFiles, FileSource, MemoryFiles};
pub use gpu::{GpuContext, HeadlessGpu, PixelFormat, TextureId};
pub use path::{ResourcePath, MAX_FILENAME_LEN};
pub use resource::{LoadContext, LoadStatus, Resource, ResourceInfo, ResourceOrigin};
pub use shared::SharedResourceCache;
pub use texture::{encode_texture, Texture};
