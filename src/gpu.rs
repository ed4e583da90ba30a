//! Graphics capability used by GPU-backed resources.
//!
//! Resources never talk to a graphics API directly. They request handles,
//! upload pixels and free handles through [`GpuContext`], so the cache can be
//! driven by a real backend or by [`HeadlessGpu`] in tools and tests.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::error::{ResourceError, Result};

/// Opaque texture handle issued by a [`GpuContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Luminance8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Luminance8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    pub fn from_bytes_per_pixel(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(PixelFormat::Luminance8),
            3 => Some(PixelFormat::Rgb8),
            4 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == PixelFormat::Rgba8
    }
}

pub trait GpuContext: Send {
    fn allocate_texture(&mut self) -> Result<TextureId>;

    fn upload_pixels(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: &[u8],
    ) -> Result<()>;

    fn free_texture(&mut self, id: TextureId);
}

/// Texture state recorded by [`HeadlessGpu`] for each live handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureUpload {
    pub width: u32,
    pub height: u32,
    pub format: Option<PixelFormat>,
    pub bytes: usize,
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_id: u32,
    max_textures: Option<usize>,
    textures: HashMap<TextureId, TextureUpload>,
    freed: usize,
}

/// In-memory graphics context that tracks handles without a device.
///
/// Clones share the same state, so a test or tool can keep a clone around to
/// inspect what the cache did with the one it was given.
#[derive(Debug, Default)]
pub struct HeadlessGpu {
    state: Arc<Mutex<HeadlessState>>,
}

impl Clone for HeadlessGpu {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl HeadlessGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of simultaneously live handles.
    pub fn with_texture_limit(max_textures: usize) -> Self {
        let gpu = Self::default();
        gpu.state.lock().max_textures = Some(max_textures);
        gpu
    }

    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    pub fn freed_textures(&self) -> usize {
        self.state.lock().freed
    }

    pub fn texture(&self, id: TextureId) -> Option<TextureUpload> {
        self.state.lock().textures.get(&id).cloned()
    }

    pub fn uploaded_bytes(&self) -> usize {
        self.state
            .lock()
            .textures
            .values()
            .map(|upload| upload.bytes)
            .sum()
    }
}

impl GpuContext for HeadlessGpu {
    fn allocate_texture(&mut self) -> Result<TextureId> {
        let mut state = self.state.lock();
        if let Some(limit) = state.max_textures {
            if state.textures.len() >= limit {
                return Err(ResourceError::AllocationFailed(format!(
                    "texture handle ({limit} already live)"
                )));
            }
        }
        state.next_id += 1;
        let id = TextureId(state.next_id);
        state.textures.insert(id, TextureUpload::default());
        debug!("allocated texture handle {}", id.0);
        Ok(id)
    }

    fn upload_pixels(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: &[u8],
    ) -> Result<()> {
        let mut state = self.state.lock();
        let upload = state.textures.get_mut(&id).ok_or_else(|| {
            ResourceError::AllocationFailed(format!("upload to unknown texture handle {}", id.0))
        })?;
        *upload = TextureUpload {
            width,
            height,
            format: Some(format),
            bytes: pixels.len(),
        };
        Ok(())
    }

    fn free_texture(&mut self, id: TextureId) {
        let mut state = self.state.lock();
        if state.textures.remove(&id).is_some() {
            state.freed += 1;
            debug!("freed texture handle {}", id.0);
        }
    }
}
