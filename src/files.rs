//! File-reading primitives consumed by resource loaders.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{ResourceError, Result};
use crate::path::normalize;

/// Source of asset bytes addressed by normalized resource paths.
pub trait FileSource: Send + Sync {
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    fn exists(&self, path: &str) -> bool;
}

impl<F: FileSource + ?Sized> FileSource for Box<F> {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read(path)
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct DiskFiles {
    root: PathBuf,
}

impl DiskFiles {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let exact = self.root.join(path);
        if exact.exists() {
            return exact;
        }
        // Cache paths arrive lower-cased; fall back to a case-insensitive
        // match one directory level at a time.
        let mut resolved = self.root.clone();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            let matched = fs::read_dir(&resolved).ok().and_then(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.file_name())
                    .find(|name| name.to_string_lossy().to_ascii_lowercase() == component)
            });
            match matched {
                Some(name) => resolved.push(name),
                None => return exact,
            }
        }
        resolved
    }
}

impl FileSource for DiskFiles {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|err| {
            if err.kind() != ErrorKind::NotFound {
                warn!("unable to read {}: {err}", full.display());
            }
            ResourceError::FileNotFound(path.to_string())
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}

/// Assets compiled into the binary or generated at startup.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(normalize(path), data.into());
    }

    pub fn with(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl FileSource for MemoryFiles {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| ResourceError::FileNotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }
}
