//! Removal of duplicate files.
//!
//! # Overview
//!
//! This module deletes the `remove` records of resolved duplicate groups:
//! - Dry run (default) only reports what would be removed
//! - Every file's size is re-verified right before it is unlinked
//! - A size mismatch aborts the whole removal; nothing after it is touched
//! - Any other failure is recorded and the remaining files are processed
//!
//! The keep record of a group is never passed to the filesystem.
//!
//! # Example
//!
//! ```no_run
//! use dupcull::actions::delete::{remove_duplicates, DeleteConfig};
//! # let groups: Vec<dupcull::duplicates::DuplicateGroup> = Vec::new();
//!
//! let report = remove_duplicates(&groups, &DeleteConfig::dry_run()).unwrap();
//! println!("{}", report.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::resolver::{verify_size, ConsistencyError};
use crate::duplicates::DuplicateGroup;
use crate::scanner::FileRecord;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File changed since it was scanned. Fatal for the whole removal.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// Removal was interrupted by the user.
    #[error("removal interrupted by user")]
    Interrupted,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => Some(p),
            Self::Consistency(e) => e.path(),
            Self::Interrupted => None,
        }
    }

    /// Whether this error must stop all further removals.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Consistency(_) | Self::Interrupted)
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
}

/// Outcome of removing (or pretending to remove) every duplicate.
#[derive(Debug, Clone, Default)]
pub struct RemovalReport {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Files removed (or that would be removed in a dry run).
    pub removed: Vec<DeleteResult>,
    /// Failed removals with their error messages.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes freed (or that would be freed).
    pub bytes_freed: u64,
}

impl RemovalReport {
    /// Number of files removed.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Number of failed removals.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every removal succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "Would remove" } else { "Removed" };
        let mut line = format!(
            "{} file count: {} Size: {}",
            verb,
            self.removed_count(),
            ByteSize::b(self.bytes_freed)
        );
        if !self.all_succeeded() {
            line.push_str(&format!(" ({} failed)", self.failure_count()));
        }
        line
    }
}

/// Configuration for removal.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfig {
    /// Only report, never touch the filesystem.
    pub dry_run: bool,
    /// Optional shutdown flag checked before every deletion.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl DeleteConfig {
    /// Configuration that only reports.
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            shutdown_flag: None,
        }
    }

    /// Configuration that really deletes.
    #[must_use]
    pub fn remove() -> Self {
        Self::default()
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Permanently delete one file after re-verifying its size.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `Consistency` if the file's size changed or it cannot be stat'ed
/// - `NotFound`, `PermissionDenied` or `Io` if unlinking fails
pub fn remove_file(record: &FileRecord) -> Result<DeleteResult, DeleteError> {
    verify_size(record)?;

    fs::remove_file(&record.path).map_err(|e| {
        log::error!("Delete failed for {}: {}", record.path.display(), e);
        DeleteError::from_io(&record.path, e)
    })?;

    log::info!(
        "Deleted: {} ({} bytes)",
        record.path.display(),
        record.size
    );

    Ok(DeleteResult {
        path: record.path.clone(),
        size: record.size,
    })
}

/// Remove every `remove` record of every group.
///
/// # Errors
///
/// Returns a fatal [`DeleteError`] (size mismatch or interruption) as soon
/// as one occurs. Files already deleted stay deleted; nothing after the
/// failing file is touched. Non-fatal failures are collected in the report.
pub fn remove_duplicates(
    groups: &[DuplicateGroup],
    config: &DeleteConfig,
) -> Result<RemovalReport, DeleteError> {
    let mut report = RemovalReport {
        dry_run: config.dry_run,
        ..RemovalReport::default()
    };

    for group in groups {
        for record in &group.remove {
            if config.is_shutdown_requested() {
                log::info!("Removal interrupted after {} file(s)", report.removed_count());
                return Err(DeleteError::Interrupted);
            }

            if config.dry_run {
                log::debug!("Would remove: {}", record.path.display());
                report.bytes_freed += record.size;
                report.removed.push(DeleteResult {
                    path: record.path.clone(),
                    size: record.size,
                });
                continue;
            }

            match remove_file(record) {
                Ok(result) => {
                    report.bytes_freed += result.size;
                    report.removed.push(result);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("Failed to remove {}: {}", record.path.display(), e);
                    report.failures.push((record.path.clone(), e.to_string()));
                }
            }
        }
    }

    log::info!("{}", report.summary());
    Ok(report)
}
