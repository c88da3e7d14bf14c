//! Scanner module for file discovery and content sampling.
//!
//! This module provides functionality for:
//! - Directory traversal producing [`FileRecord`]s with a root priority
//! - Device/inode identity for hardlink collapsing
//! - Prefix, suffix and whole-file content fingerprints
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hardlink`]: Device/inode identity extraction
//! - [`sampler`]: Bounded reads and fingerprints (xxh3 / BLAKE3)
//!
//! # Example
//!
//! ```no_run
//! use dupcull::scanner::Walker;
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("/data"), PathBuf::from("/backup")]);
//! for record in walker.walk() {
//!     match record {
//!         Ok(file) => println!("{} ({} bytes, priority {})", file.path.display(), file.size, file.priority),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hardlink;
pub mod sampler;
pub mod walker;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use hardlink::file_id;
pub use sampler::{Fingerprint, ReadStrategy, Sample, Sampler};
pub use walker::Walker;

/// Identity of the on-disk allocation behind a path.
///
/// Two records with the same `FileId` are hardlinks to the same data and
/// must be treated as a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId {
    /// Device number of the containing filesystem
    pub dev: u64,
    /// Inode number within that device
    pub ino: u64,
}

impl FileId {
    /// Create a new identifier from a device and inode pair.
    #[must_use]
    pub const fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }
}

/// A file under consideration as a duplicate candidate.
///
/// The path is used for I/O and reporting only; identity comes from
/// [`FileId`] and grouping from `size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Rank of the root this file was found under (higher is preferred)
    pub priority: u32,
    /// Location of the file
    pub path: PathBuf,
    /// Device/inode identity
    pub id: FileId,
    /// Size in bytes captured at scan time
    pub size: u64,
}

impl FileRecord {
    /// Create a new FileRecord.
    ///
    /// # Arguments
    ///
    /// * `priority` - Rank of the root directory (higher wins ties)
    /// * `path` - Path to the file
    /// * `id` - Device/inode identity
    /// * `size` - File size in bytes
    #[must_use]
    pub fn new(priority: u32, path: PathBuf, id: FileId, size: u64) -> Self {
        Self {
            priority,
            path,
            id,
            size,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while sampling a file's content.
///
/// These are always recoverable: the file is dropped from the candidate
/// set and the stage carries on.
#[derive(thiserror::Error, Debug)]
pub enum SampleError {
    /// The file disappeared between scan and read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl SampleError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}
