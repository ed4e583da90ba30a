//! GPU texture resource.
//!
//! Texture files start with a 16-byte little-endian header followed by tightly
//! packed RGB8 or RGBA8 rows:
//!
//! | offset | field  | notes                      |
//! |--------|--------|----------------------------|
//! | 0      | magic  | `PRTX`                     |
//! | 4      | width  | pixels, non-zero           |
//! | 8      | height | pixels, non-zero           |
//! | 12     | flags  | bit 0 set: RGBA, else RGB  |

use std::any::Any;

use bytemuck::{Pod, Zeroable};
use glam::UVec2;
use log::trace;

use crate::error::{ResourceError, Result};
use crate::gpu::{PixelFormat, TextureId};
use crate::path::ResourcePath;
use crate::resource::{LoadContext, Resource};

pub const TEXTURE_MAGIC: [u8; 4] = *b"PRTX";
pub const FLAG_ALPHA: u32 = 1;

const HEADER_LEN: usize = std::mem::size_of::<TextureHeader>();

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct TextureHeader {
    magic: [u8; 4],
    width: u32,
    height: u32,
    flags: u32,
}

/// A texture owned by the resource cache.
///
/// After a failed load or after unloading, the texture is inert: zero sized
/// and without a GPU handle.
#[derive(Debug, Default)]
pub struct Texture {
    name: String,
    width: u32,
    height: u32,
    has_alpha: bool,
    tex_id: Option<TextureId>,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn tex_id(&self) -> Option<TextureId> {
        self.tex_id
    }

    pub fn is_loaded(&self) -> bool {
        self.tex_id.is_some()
    }

    /// Decodes an encoded texture and uploads it. `strip_alpha` drops the
    /// alpha channel of RGBA payloads before upload.
    fn decode_and_upload(
        &mut self,
        ctx: &mut LoadContext<'_>,
        data: &[u8],
        strip_alpha: bool,
    ) -> Result<u64> {
        let header = parse_header(&self.name, data)?;
        let has_alpha = header.flags & FLAG_ALPHA != 0;
        let format = if has_alpha {
            PixelFormat::Rgba8
        } else {
            PixelFormat::Rgb8
        };
        let expected = payload_len(header.width, header.height, format)
            .ok_or_else(|| ResourceError::corrupt(&self.name, "dimensions overflow"))?;
        let payload = &data[HEADER_LEN..];
        if payload.len() < expected {
            return Err(ResourceError::corrupt(
                &self.name,
                format!(
                    "payload holds {} bytes, {}x{} needs {expected}",
                    payload.len(),
                    header.width,
                    header.height
                ),
            ));
        }
        let payload = &payload[..expected];

        if has_alpha && strip_alpha {
            let rgb: Vec<u8> = payload
                .chunks_exact(4)
                .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                .collect();
            self.upload(ctx, header.width, header.height, PixelFormat::Rgb8, &rgb)?;
            self.has_alpha = false;
            return Ok(rgb.len() as u64);
        }

        self.upload(ctx, header.width, header.height, format, payload)?;
        self.has_alpha = has_alpha;
        Ok(payload.len() as u64)
    }

    fn upload(
        &mut self,
        ctx: &mut LoadContext<'_>,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: &[u8],
    ) -> Result<()> {
        let id = ctx.gpu().allocate_texture()?;
        // Keep the handle before uploading so a failed upload is still freed.
        self.tex_id = Some(id);
        ctx.gpu().upload_pixels(id, width, height, format, pixels)?;
        self.width = width;
        self.height = height;
        trace!("uploaded {} as {width}x{height} {format:?}", self.name);
        Ok(())
    }
}

fn parse_header(name: &str, data: &[u8]) -> Result<TextureHeader> {
    let bytes = data
        .get(..HEADER_LEN)
        .ok_or_else(|| ResourceError::corrupt(name, "file too small for texture header"))?;
    let raw: TextureHeader = bytemuck::pod_read_unaligned(bytes);
    if raw.magic != TEXTURE_MAGIC {
        return Err(ResourceError::corrupt(
            name,
            format!("bad magic {:?}", raw.magic),
        ));
    }
    let header = TextureHeader {
        magic: raw.magic,
        width: u32::from_le(raw.width),
        height: u32::from_le(raw.height),
        flags: u32::from_le(raw.flags),
    };
    if header.width == 0 || header.height == 0 {
        return Err(ResourceError::corrupt(name, "zero texture dimension"));
    }
    Ok(header)
}

fn payload_len(width: u32, height: u32, format: PixelFormat) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(format.bytes_per_pixel())
}

/// Encodes pixels in the texture file format.
pub fn encode_texture(width: u32, height: u32, has_alpha: bool, pixels: &[u8]) -> Vec<u8> {
    let header = TextureHeader {
        magic: TEXTURE_MAGIC,
        width: width.to_le(),
        height: height.to_le(),
        flags: (if has_alpha { FLAG_ALPHA } else { 0 }).to_le(),
    };
    let mut out = Vec::with_capacity(HEADER_LEN + pixels.len());
    out.extend_from_slice(bytemuck::bytes_of(&header));
    out.extend_from_slice(pixels);
    out
}

impl Resource for Texture {
    fn create(path: &ResourcePath) -> Self {
        Texture {
            name: path.to_string(),
            ..Texture::default()
        }
    }

    /// A non-zero `extra` discards the alpha channel.
    fn load(&mut self, ctx: &mut LoadContext<'_>, extra: i32) -> Result<u64> {
        let data = ctx.files().read(&self.name)?;
        self.decode_and_upload(ctx, &data, extra != 0)
    }

    fn load_from_memory(&mut self, ctx: &mut LoadContext<'_>, data: &[u8]) -> Result<u64> {
        self.decode_and_upload(ctx, data, false)
    }

    /// `data` holds `width * height` pixels of 1 (luminance), 3 (RGB) or 4
    /// (RGBA) bytes each; the format follows from the length.
    fn load_from_raw(
        &mut self,
        ctx: &mut LoadContext<'_>,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<u64> {
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .filter(|pixels| *pixels > 0)
            .ok_or_else(|| ResourceError::corrupt(&self.name, "bad raw texture dimensions"))?;
        let format = (data.len() % pixels == 0)
            .then(|| PixelFormat::from_bytes_per_pixel(data.len() / pixels))
            .flatten()
            .ok_or_else(|| {
                ResourceError::corrupt(
                    &self.name,
                    format!("{} bytes do not describe {width}x{height} pixels", data.len()),
                )
            })?;
        self.upload(ctx, width, height, format, data)?;
        self.has_alpha = format.has_alpha();
        Ok(data.len() as u64)
    }

    fn unload(&mut self, ctx: &mut LoadContext<'_>) {
        if let Some(id) = self.tex_id.take() {
            ctx.gpu().free_texture(id);
        }
        self.width = 0;
        self.height = 0;
        self.has_alpha = false;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MemoryFiles;
    use crate::gpu::HeadlessGpu;
    use crate::path::MAX_FILENAME_LEN;

    fn texture(name: &str) -> Texture {
        Texture::create(&ResourcePath::new(name, MAX_FILENAME_LEN).unwrap())
    }

    fn checker_rgba() -> Vec<u8> {
        vec![
            255, 0, 0, 255, 0, 255, 0, 128, //
            0, 0, 255, 0, 255, 255, 255, 255,
        ]
    }

    #[test]
    fn load_rgba_file() {
        let files = MemoryFiles::new().with(
            "tex/checker.prtx",
            encode_texture(2, 2, true, &checker_rgba()),
        );
        let mut gpu = HeadlessGpu::new();
        let mut ctx = LoadContext {
            files: &files,
            gpu: &mut gpu,
        };
        let mut tex = texture("tex/checker.prtx");
        assert_eq!(tex.load(&mut ctx, 0).unwrap(), 16);
        assert_eq!(tex.dimensions(), UVec2::new(2, 2));
        assert!(tex.has_alpha());
        let upload = gpu.texture(tex.tex_id().unwrap()).unwrap();
        assert_eq!(upload.format, Some(PixelFormat::Rgba8));
        assert_eq!(upload.bytes, 16);
    }

    #[test]
    fn extra_strips_alpha() {
        let files =
            MemoryFiles::new().with("a.prtx", encode_texture(2, 2, true, &checker_rgba()));
        let mut gpu = HeadlessGpu::new();
        let mut ctx = LoadContext {
            files: &files,
            gpu: &mut gpu,
        };
        let mut tex = texture("a.prtx");
        assert_eq!(tex.load(&mut ctx, 1).unwrap(), 12);
        assert!(!tex.has_alpha());
        let upload = gpu.texture(tex.tex_id().unwrap()).unwrap();
        assert_eq!(upload.format, Some(PixelFormat::Rgb8));
    }

    #[test]
    fn rgb_from_memory() {
        let files = MemoryFiles::new();
        let mut gpu = HeadlessGpu::new();
        let mut ctx = LoadContext {
            files: &files,
            gpu: &mut gpu,
        };
        let mut tex = texture("builtin/white");
        let data = encode_texture(1, 1, false, &[255, 255, 255]);
        assert_eq!(tex.load_from_memory(&mut ctx, &data).unwrap(), 3);
        assert!(!tex.has_alpha());
        assert_eq!(tex.width(), 1);
    }

    #[test]
    fn corrupt_headers_are_rejected() {
        let mut bad_magic = encode_texture(1, 1, false, &[0, 0, 0]);
        bad_magic[0] = b'X';
        let zero = encode_texture(0, 4, false, &[]);
        let short = encode_texture(4, 4, true, &[0; 10]);
        let files = MemoryFiles::new();
        let mut gpu = HeadlessGpu::new();
        let observer = gpu.clone();
        let mut ctx = LoadContext {
            files: &files,
            gpu: &mut gpu,
        };
        for data in [&bad_magic[..], &zero[..], &short[..], &b"PRTX"[..]] {
            let mut tex = texture("bad.prtx");
            assert!(matches!(
                tex.load_from_memory(&mut ctx, data),
                Err(ResourceError::HeaderCorrupt { .. })
            ));
            assert!(!tex.is_loaded());
        }
        assert_eq!(observer.live_textures(), 0);
    }

    #[test]
    fn missing_file_is_reported() {
        let files = MemoryFiles::new();
        let mut gpu = HeadlessGpu::new();
        let mut ctx = LoadContext {
            files: &files,
            gpu: &mut gpu,
        };
        let mut tex = texture("missing.prtx");
        assert_eq!(
            tex.load(&mut ctx, 0),
            Err(ResourceError::FileNotFound("missing.prtx".into()))
        );
    }

    #[test]
    fn raw_pixels_must_match_dimensions() {
        let files = MemoryFiles::new();
        let mut gpu = HeadlessGpu::new();
        let mut ctx = LoadContext {
            files: &files,
            gpu: &mut gpu,
        };
        let mut tex = texture("frame");
        assert!(tex.load_from_raw(&mut ctx, &[0; 15], 2, 2).is_err());
        assert!(tex.load_from_raw(&mut ctx, &[0; 8], 2, 2).is_err());
        assert!(tex.load_from_raw(&mut ctx, &[0; 4], 0, 2).is_err());
        assert_eq!(tex.load_from_raw(&mut ctx, &[0; 16], 2, 2).unwrap(), 16);
        assert!(tex.has_alpha());

        let mut mask = texture("mask");
        assert_eq!(mask.load_from_raw(&mut ctx, &[0; 1024], 32, 32).unwrap(), 1024);
        assert!(!mask.has_alpha());
        assert_eq!(mask.dimensions(), UVec2::new(32, 32));
    }

    #[test]
    fn allocation_failure_leaves_texture_inert() {
        let files = MemoryFiles::new();
        let mut gpu = HeadlessGpu::with_texture_limit(0);
        let mut ctx = LoadContext {
            files: &files,
            gpu: &mut gpu,
        };
        let mut tex = texture("frame");
        assert!(matches!(
            tex.load_from_raw(&mut ctx, &[0; 4], 1, 1),
            Err(ResourceError::AllocationFailed(_))
        ));
        assert!(!tex.is_loaded());
        assert_eq!(tex.dimensions(), UVec2::ZERO);
    }

    #[test]
    fn unload_is_idempotent() {
        let files = MemoryFiles::new();
        let mut gpu = HeadlessGpu::new();
        let observer = gpu.clone();
        let mut ctx = LoadContext {
            files: &files,
            gpu: &mut gpu,
        };
        let mut tex = texture("frame");
        tex.load_from_raw(&mut ctx, &[0; 4], 1, 1).unwrap();
        tex.unload(&mut ctx);
        tex.unload(&mut ctx);
        assert_eq!(tex.dimensions(), UVec2::ZERO);
        assert!(tex.tex_id().is_none());
        assert_eq!(observer.freed_textures(), 1);
        assert_eq!(observer.live_textures(), 0);

        let id = ctx.gpu().allocate_texture().unwrap();
        assert!(observer.texture(id).is_some());
    }
}
