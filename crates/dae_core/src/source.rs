//! Named byte sources.
//!
//! The parser only needs to fetch a document (and, for embedded assets, any
//! other member) by name and read it fully into memory. Archive containers
//! plug in by implementing [`ByteSource`]; the crate ships a filesystem
//! source and an in-memory one.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Opens a named stream and returns its full contents.
///
/// Implementations must not keep handles open after `read` returns.
pub trait ByteSource {
    fn read(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Whether `name` can be opened. The default tries a read.
    fn exists(&self, name: &str) -> bool {
        self.read(name).is_ok()
    }
}

/// Reads files relative to an optional base directory.
#[derive(Clone, Debug, Default)]
pub struct FileSource {
    base: Option<PathBuf>,
}

impl FileSource {
    /// Resolve names against the current working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative names against `base`.
    pub fn with_base<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base: Some(base.as_ref().to_path_buf()),
        }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ByteSource for FileSource {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_file()
    }
}

/// In-memory named blobs, e.g. members already extracted from an archive.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), bytes.into());
    }
}

impl ByteSource for MemorySource {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        self.entries.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no entry named {}", name))
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
