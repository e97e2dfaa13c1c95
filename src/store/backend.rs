//! Trait abstraction for the removable storage medium to enable testing

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Raw open primitives of the storage medium
///
/// Names are flat file names relative to the medium root
/// (e.g. `2025-03-01.txt`, `weeks_average.txt`).
#[cfg_attr(test, mockall::automock)]
pub trait StorageBackend: Send + Sync {
    /// Open (creating if needed) a file positioned for appending
    fn open_for_append(&self, name: &str) -> io::Result<Box<dyn Write>>;

    /// Open an existing file for buffered reading
    ///
    /// Absent files report `io::ErrorKind::NotFound`.
    fn open_for_read(&self, name: &str) -> io::Result<Box<dyn BufRead>>;
}

/// Storage backend over a directory of the local filesystem
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Create a backend rooted at `root` (the mount point of the medium)
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of the medium
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when the root directory is present (medium mounted)
    pub fn is_mounted(&self) -> bool {
        self.root.is_dir()
    }
}

impl StorageBackend for FsBackend {
    fn open_for_append(&self, name: &str) -> io::Result<Box<dyn Write>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(name))?;
        Ok(Box::new(file))
    }

    fn open_for_read(&self, name: &str) -> io::Result<Box<dyn BufRead>> {
        let file = File::open(self.root.join(name))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
