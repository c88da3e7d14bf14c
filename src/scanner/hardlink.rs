//! Device/inode identity extraction for hardlink collapsing.
//!
//! # Overview
//!
//! Hardlinks are multiple directory entries pointing to the same inode on disk.
//! They share the same content but are NOT duplicates - they're the same file.
//! Deleting one of them frees nothing, so the record store collapses every
//! record that shares a [`FileId`] into a single candidate.
//!
//! # Platform Support
//!
//! - **Unix**: Uses (device_id, inode) pairs from file metadata
//! - **Other**: No identity is available; [`IdAllocator`] hands out synthetic
//!   unique identifiers so that every path is its own candidate

use std::fs::Metadata;
use std::sync::atomic::{AtomicU64, Ordering};

use super::FileId;

/// Device number used for synthetic identifiers.
///
/// No real filesystem reports this value, so synthetic ids never collide
/// with real ones.
pub const SYNTHETIC_DEVICE: u64 = u64::MAX;

/// Extract the device/inode identity of a file.
///
/// Returns `None` if the platform doesn't expose inode information.
#[cfg(unix)]
#[must_use]
pub fn file_id(metadata: &Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;
    Some(FileId::new(metadata.dev(), metadata.ino()))
}

/// Extract the device/inode identity of a file.
///
/// Returns `None` if the platform doesn't expose inode information.
#[cfg(not(unix))]
#[must_use]
pub fn file_id(_metadata: &Metadata) -> Option<FileId> {
    None
}

/// Hands out identifiers, falling back to synthetic ones where the
/// platform has no inode numbers.
///
/// Shared by every root of a walk so synthetic identifiers stay unique
/// across roots.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_synthetic: AtomicU64,
}

impl IdAllocator {
    /// Create a new allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity for the given metadata, synthesizing one if necessary.
    pub fn identify(&self, metadata: &Metadata) -> FileId {
        file_id(metadata).unwrap_or_else(|| {
            FileId::new(
                SYNTHETIC_DEVICE,
                self.next_synthetic.fetch_add(1, Ordering::Relaxed),
            )
        })
    }
}
