//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct which traverses one or more
//! root directories and produces [`FileRecord`]s for duplicate detection.
//! Every record carries the priority of the root it was found under: with
//! `n` roots, the first root gets priority `n` and the last gets `1`.
//!
//! # Rules
//!
//! - Only regular, non-empty files are emitted
//! - Symlinks are never followed
//! - Permission-denied entries are skipped silently (logged at debug)
//! - Children are sorted by name so the output order is deterministic
//!
//! Overlapping roots produce the same [`FileId`](super::FileId) twice; the
//! record store keeps the first one seen, which is the higher priority.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::hardlink::IdAllocator;
use super::{FileRecord, ScanError};

/// Directory walker for multi-root file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Roots in priority order (first is highest)
    roots: Vec<PathBuf>,
    /// Identity source shared across roots
    ids: IdAllocator,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker over the given roots.
    ///
    /// The order of `roots` defines priority: earlier roots are preferred
    /// when choosing which copy of a duplicate to keep.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ids: IdAllocator::new(),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker will stop iteration
    /// as soon as possible.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Priority assigned to the root at `index`.
    #[must_use]
    pub fn priority_of(&self, index: usize) -> u32 {
        u32::try_from(self.roots.len().saturating_sub(index)).unwrap_or(u32::MAX)
    }

    /// Check that every root exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns the first offending root as [`ScanError::NotFound`] or
    /// [`ScanError::NotADirectory`].
    pub fn validate_roots(&self) -> Result<(), ScanError> {
        for root in &self.roots {
            validate_root(root)?;
        }
        Ok(())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk every root, yielding file records.
    ///
    /// Directories that cannot be listed and files that cannot be stat'ed
    /// are yielded as [`ScanError`] values rather than stopping iteration.
    /// Permission denied is the exception: those entries are skipped.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        self.roots
            .iter()
            .enumerate()
            .flat_map(move |(index, root)| self.walk_root(root, self.priority_of(index)))
    }

    fn walk_root<'a>(
        &'a self,
        root: &'a Path,
        priority: u32,
    ) -> impl Iterator<Item = Result<FileRecord, ScanError>> + 'a {
        log::debug!("Walking {} (priority {})", root.display(), priority);

        let walk_dir = WalkDir::new(root)
            .follow_links(false)
            .skip_hidden(false)
            .sort(true);

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    return false;
                }
                true
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if let Some(ref err) = entry.read_children_error {
                        let path = err.path().map_or_else(|| entry.path(), Path::to_path_buf);
                        return walk_error(path, err);
                    }
                    if entry.depth == 0 || !entry.file_type().is_file() {
                        return None;
                    }
                    let path = entry.path();
                    match std::fs::symlink_metadata(&path) {
                        Ok(metadata) => self.make_record(path, &metadata, priority),
                        Err(e) => self.handle_io_error(path, e),
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    walk_error(path, &e)
                }
            })
    }

    fn make_record(
        &self,
        path: PathBuf,
        metadata: &std::fs::Metadata,
        priority: u32,
    ) -> Option<Result<FileRecord, ScanError>> {
        if !metadata.is_file() {
            return None;
        }
        let size = metadata.len();
        if size == 0 {
            log::trace!("Skipping empty file: {}", path.display());
            return None;
        }
        let id = self.ids.identify(metadata);
        log::trace!("Found {} ({} bytes, id {})", path.display(), size, id);
        Some(Ok(FileRecord::new(priority, path, id, size)))
    }

    fn handle_io_error(
        &self,
        path: PathBuf,
        error: std::io::Error,
    ) -> Option<Result<FileRecord, ScanError>> {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::debug!("Permission denied, skipping: {}", path.display());
                None
            }
            ErrorKind::NotFound => {
                log::debug!("File vanished during scan: {}", path.display());
                None
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                Some(Err(ScanError::Io {
                    path,
                    source: error,
                }))
            }
        }
    }
}

fn walk_error(path: PathBuf, error: &jwalk::Error) -> Option<Result<FileRecord, ScanError>> {
    classify_walk_error(path, error.io_error().map(io::Error::kind), error.to_string())
}

/// Skip permission denied; turn anything else into a [`ScanError::Io`]
/// that keeps the underlying error kind.
fn classify_walk_error(
    path: PathBuf,
    kind: Option<io::ErrorKind>,
    message: String,
) -> Option<Result<FileRecord, ScanError>> {
    match kind {
        Some(io::ErrorKind::PermissionDenied) => {
            log::debug!("Permission denied, skipping: {}", path.display());
            None
        }
        kind => {
            log::warn!("Walker error for {}: {}", path.display(), message);
            Some(Err(ScanError::Io {
                path,
                source: io::Error::new(kind.unwrap_or(io::ErrorKind::Other), message),
            }))
        }
    }
}

/// Check that a single root exists and is a directory.
///
/// # Errors
///
/// [`ScanError::NotFound`] if the path is missing, [`ScanError::NotADirectory`]
/// if it is something else.
pub fn validate_root(root: &Path) -> Result<(), ScanError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ScanError::NotFound(root.to_path_buf()))
        }
        Err(e) => Err(ScanError::Io {
            path: root.to_path_buf(),
            source: e,
        }),
    }
}
