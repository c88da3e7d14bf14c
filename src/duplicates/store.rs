//! Working set of candidate records.
//!
//! The [`RecordStore`] owns every candidate between pipeline stages. It
//! collapses hardlinks on insert: a record whose [`FileId`] is already
//! present is ignored, so the first path seen for an inode wins.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::scanner::{FileId, FileRecord};

use super::groups::bucket_by;

/// File and byte totals of the working set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of records
    pub files: usize,
    /// Sum of record sizes
    pub bytes: u64,
}

/// Candidate records, deduplicated by device and inode.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<FileRecord>,
    seen: HashSet<FileId>,
    bytes: u64,
}

impl RecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record.
    ///
    /// Returns `false` without changing anything if a record with the same
    /// identifier is already present.
    pub fn add_record(&mut self, record: FileRecord) -> bool {
        if !self.seen.insert(record.id) {
            log::trace!(
                "Collapsing hardlink {} (id {})",
                record.path.display(),
                record.id
            );
            return false;
        }
        self.bytes += record.size;
        self.records.push(record);
        true
    }

    /// Current totals.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            files: self.records.len(),
            bytes: self.bytes,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Partition a copy of the working set by `key_fn`.
    #[must_use]
    pub fn bucket<K, F>(&self, key_fn: F) -> HashMap<K, Vec<FileRecord>>
    where
        K: Eq + Hash,
        F: FnMut(&FileRecord) -> K,
    {
        bucket_by(self.records.iter().cloned(), key_fn)
    }

    /// Move every record out, leaving the store empty.
    pub fn take_records(&mut self) -> Vec<FileRecord> {
        self.seen.clear();
        self.bytes = 0;
        std::mem::take(&mut self.records)
    }

    /// Replace the working set with the survivors of a stage.
    ///
    /// Identifiers are re-deduplicated, so replacing with a list that
    /// contains the same `FileId` twice keeps only the first.
    pub fn replace_records(&mut self, records: impl IntoIterator<Item = FileRecord>) {
        self.reset();
        for record in records {
            self.add_record(record);
        }
    }

    /// Drop every record.
    pub fn reset(&mut self) {
        self.records.clear();
        self.seen.clear();
        self.bytes = 0;
    }
}
