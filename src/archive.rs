use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;

use crate::error::ResourceError;
use crate::files::FileSource;
use crate::path::normalize;

const MAGIC: &[u8; 4] = b"PRAR";
const HEADER_LEN: usize = 16;

/// File entry extracted from the archive table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFileEntry {
    /// Normalized entry name.
    pub name: String,
    pub offset: u64,
    pub size: u64,
}

/// Read-only packed asset archive (`PRAR`).
#[derive(Debug)]
pub struct AssetArchive {
    backing: ArchiveBacking,
    version: u32,
    files: Vec<ArchiveFileEntry>,
}

#[derive(Debug)]
enum ArchiveBacking {
    File { path: PathBuf, handle: Mutex<File> },
    Memory(Arc<[u8]>),
}

impl AssetArchive {
    /// Opens an archive from disk, reading only the header and table of
    /// contents.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut file = File::open(&path_buf)
            .with_context(|| format!("unable to open {}", path_buf.display()))?;
        let len = file
            .metadata()
            .context("unable to stat archive")?
            .len();

        let mut header = [0u8; HEADER_LEN];
        file.read_exact(&mut header)
            .context("archive too small to contain header")?;
        let (version, toc_offset) = parse_header(&header, len)?;

        file.seek(SeekFrom::Start(toc_offset))
            .context("unable to seek to table of contents")?;
        let mut toc = Vec::new();
        file.read_to_end(&mut toc)
            .context("unable to read table of contents")?;
        let files = parse_toc(&toc, len)?;

        Ok(Self {
            backing: ArchiveBacking::File {
                path: path_buf,
                handle: Mutex::new(file),
            },
            version,
            files,
        })
    }

    /// Creates an archive from bytes already resident in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let storage: Arc<[u8]> = Arc::from(data.into_boxed_slice());
        let len = storage.len() as u64;
        if storage.len() < HEADER_LEN {
            return Err(anyhow!(
                "archive too small to contain header (len={len})"
            ));
        }
        let (version, toc_offset) = parse_header(&storage[..HEADER_LEN], len)?;
        let files = parse_toc(&storage[toc_offset as usize..], len)?;
        Ok(Self {
            backing: ArchiveBacking::Memory(storage),
            version,
            files,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn files(&self) -> &[ArchiveFileEntry] {
        &self.files
    }

    /// Looks up an entry by name, using the same normalization as the cache.
    pub fn file(&self, name: &str) -> Option<&ArchiveFileEntry> {
        let name = normalize(name);
        self.files.iter().find(|entry| entry.name == name)
    }

    pub fn extract_file(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .file(name)
            .ok_or_else(|| anyhow!("file not found in archive: {name}"))?;
        self.extract_entry(entry)
    }

    pub fn extract_entry(&self, entry: &ArchiveFileEntry) -> Result<Vec<u8>> {
        let size = usize::try_from(entry.size)
            .map_err(|_| anyhow!("entry {} is too large for this platform", entry.name))?;
        match &self.backing {
            ArchiveBacking::File { path, handle } => {
                let mut file = handle.lock();
                file.seek(SeekFrom::Start(entry.offset))
                    .with_context(|| format!("unable to seek to {}", entry.name))?;
                let mut buffer = vec![0u8; size];
                file.read_exact(&mut buffer).with_context(|| {
                    format!("unable to read {} from {}", entry.name, path.display())
                })?;
                Ok(buffer)
            }
            ArchiveBacking::Memory(data) => {
                let start = entry.offset as usize;
                let end = start + size;
                if end > data.len() {
                    return Err(anyhow!(
                        "entry {} extends past archive bounds ({} > {})",
                        entry.name,
                        end,
                        data.len()
                    ));
                }
                Ok(data[start..end].to_vec())
            }
        }
    }
}

impl FileSource for AssetArchive {
    fn read(&self, path: &str) -> crate::error::Result<Vec<u8>> {
        self.extract_file(path).map_err(|err| {
            log::trace!("archive lookup failed: {err:#}");
            ResourceError::FileNotFound(path.to_string())
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.file(path).is_some()
    }
}

fn parse_header(header: &[u8], file_len: u64) -> Result<(u32, u64)> {
    let magic = &header[..4];
    if magic != MAGIC {
        return Err(anyhow!(
            "invalid archive magic: expected PRAR, found {:?}",
            magic
        ));
    }
    let version = u32::from_le_bytes(header[4..8].try_into()?);
    let toc_offset = u64::from_le_bytes(header[8..16].try_into()?);
    if toc_offset < HEADER_LEN as u64 || toc_offset.saturating_add(4) > file_len {
        return Err(anyhow!(
            "archive TOC offset {toc_offset} is outside file bounds (len={file_len})"
        ));
    }
    Ok((version, toc_offset))
}

fn parse_toc(toc: &[u8], file_len: u64) -> Result<Vec<ArchiveFileEntry>> {
    let mut cursor = 0usize;
    let count = read_u32(toc, &mut cursor)?;
    let mut files = Vec::with_capacity(count.min(4096) as usize);

    for _ in 0..count {
        let name_len = read_u32(toc, &mut cursor)? as usize;
        let name_end = cursor
            .checked_add(name_len)
            .filter(|end| *end <= toc.len())
            .ok_or_else(|| anyhow!("archive file name extends past TOC region"))?;
        let name = std::str::from_utf8(&toc[cursor..name_end])
            .map_err(|err| anyhow!("invalid UTF-8 in file name: {err}"))?;
        let name = normalize(name);
        cursor = name_end;

        let offset = read_u64(toc, &mut cursor)?;
        let size = read_u64(toc, &mut cursor)?;
        if offset < HEADER_LEN as u64
            || offset
                .checked_add(size)
                .filter(|end| *end <= file_len)
                .is_none()
        {
            return Err(anyhow!(
                "file entry {name} points outside archive bounds (offset={offset}, size={size}, len={file_len})"
            ));
        }
        files.push(ArchiveFileEntry { name, offset, size });
    }

    Ok(files)
}

fn read_u32(data: &[u8], cursor: &mut usize) -> Result<u32> {
    let bytes = data
        .get(*cursor..*cursor + 4)
        .ok_or_else(|| anyhow!("unexpected end of archive while reading 32-bit value"))?;
    *cursor += 4;
    Ok(u32::from_le_bytes(bytes.try_into()?))
}

fn read_u64(data: &[u8], cursor: &mut usize) -> Result<u64> {
    let bytes = data
        .get(*cursor..*cursor + 8)
        .ok_or_else(|| anyhow!("unexpected end of archive while reading 64-bit value"))?;
    *cursor += 8;
    Ok(u64::from_le_bytes(bytes.try_into()?))
}

/// Serializes `files` into the `PRAR` layout.
pub fn build_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(MAGIC);
    buffer.extend_from_slice(&1u32.to_le_bytes());
    buffer.extend_from_slice(&0u64.to_le_bytes());

    let mut entries = Vec::with_capacity(files.len());
    for (name, data) in files {
        entries.push((*name, buffer.len() as u64, data.len() as u64));
        buffer.extend_from_slice(data);
    }

    let toc_offset = buffer.len() as u64;
    buffer.extend_from_slice(&(files.len() as u32).to_le_bytes());
    for (name, offset, size) in entries {
        buffer.extend_from_slice(&(name.len() as u32).to_le_bytes());
        buffer.extend_from_slice(name.as_bytes());
        buffer.extend_from_slice(&offset.to_le_bytes());
        buffer.extend_from_slice(&size.to_le_bytes());
    }
    buffer[8..16].copy_from_slice(&toc_offset.to_le_bytes());
    buffer
}
