//! Keep/remove selection for confirmed duplicate sets.
//!
//! Each full-hash group keeps exactly one record: the one with the highest
//! priority, ties broken by the lowest inode and then the lowest device.
//! Every other member is scheduled for removal. Before any group is
//! returned, each removal candidate is re-stat'ed; a file whose size no
//! longer matches aborts the whole run.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::scanner::FileRecord;

use super::groups::{bucket_by, DuplicateGroup, SampledRecord};

/// A file changed (or vanished) between scanning and deletion.
#[derive(thiserror::Error, Debug)]
pub enum ConsistencyError {
    /// The file's size differs from the one recorded at scan time.
    #[error("Size mismatch for {path}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        /// The file that changed
        path: PathBuf,
        /// Size recorded at scan time
        expected: u64,
        /// Size now on disk
        actual: u64,
    },

    /// The file could not be stat'ed.
    #[error("Cannot verify {path}: {source}")]
    Stat {
        /// The file that could not be checked
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A group reached the resolver without a full-content digest.
    #[error("Group of {size}-byte files has no content digest")]
    MissingDigest {
        /// Size of the files in the group
        size: u64,
    },
}

impl ConsistencyError {
    /// Path of the offending file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SizeMismatch { path, .. } | Self::Stat { path, .. } => Some(path),
            Self::MissingDigest { .. } => None,
        }
    }
}

/// Keep-preference order: higher priority first, then lower inode, then
/// lower device.
#[must_use]
pub fn keep_order(a: &FileRecord, b: &FileRecord) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.id.ino.cmp(&b.id.ino))
        .then_with(|| a.id.dev.cmp(&b.id.dev))
}

/// Check that `record` still has the size it was scanned with.
///
/// # Errors
///
/// [`ConsistencyError::SizeMismatch`] or [`ConsistencyError::Stat`].
pub fn verify_size(record: &FileRecord) -> Result<(), ConsistencyError> {
    let metadata = std::fs::metadata(&record.path).map_err(|source| ConsistencyError::Stat {
        path: record.path.clone(),
        source,
    })?;
    if metadata.len() != record.size {
        return Err(ConsistencyError::SizeMismatch {
            path: record.path.clone(),
            expected: record.size,
            actual: metadata.len(),
        });
    }
    Ok(())
}

/// Turn full-hash survivors into duplicate groups.
///
/// Groups are sorted by size (largest first) and then by the keep
/// record's identifier. Every removal candidate is verified before this
/// returns, so a successful result is safe to act on.
///
/// # Errors
///
/// The first [`ConsistencyError`] found; no groups are returned in that
/// case.
pub fn resolve(survivors: Vec<SampledRecord>) -> Result<Vec<DuplicateGroup>, ConsistencyError> {
    let buckets = bucket_by(survivors, SampledRecord::key);
    let mut groups = Vec::with_capacity(buckets.len());

    for (key, members) in buckets {
        if members.len() < 2 {
            continue;
        }
        let digest = key
            .fingerprint
            .digest()
            .ok_or(ConsistencyError::MissingDigest { size: key.size })?;

        let mut records: Vec<FileRecord> = members.into_iter().map(|m| m.record).collect();
        records.sort_by(keep_order);
        let mut records = records.into_iter();
        let Some(keep) = records.next() else {
            continue;
        };
        let remove: Vec<FileRecord> = records.collect();

        log::debug!(
            "Group {} bytes: keep {}, remove {}",
            key.size,
            keep.path.display(),
            remove.len()
        );

        groups.push(DuplicateGroup {
            size: key.size,
            digest,
            keep,
            remove,
        });
    }

    for group in &groups {
        for record in &group.remove {
            verify_size(record)?;
        }
    }

    groups.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.keep.id.cmp(&b.keep.id)));
    Ok(groups)
}
