//! Bucketing, orphan elimination and duplicate group types.
//!
//! # Overview
//!
//! Every narrowing step of the pipeline has the same shape: partition the
//! candidates by a key, then drop every partition with fewer than two
//! members. [`bucket_by`] does the first half and [`remove_orphans`] the
//! second. Keys start out as the file size and later become
//! [`BucketKey`] (size plus content fingerprint).
//!
//! # Example
//!
//! ```
//! use dupcull::duplicates::groups::{bucket_by, remove_orphans};
//! use dupcull::scanner::{FileId, FileRecord};
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(1, PathBuf::from("/a.txt"), FileId::new(1, 1), 100),
//!     FileRecord::new(1, PathBuf::from("/b.txt"), FileId::new(1, 2), 100),
//!     FileRecord::new(1, PathBuf::from("/c.txt"), FileId::new(1, 3), 200),
//! ];
//!
//! let buckets = bucket_by(files, |f| f.size);
//! let (survivors, stats) = remove_orphans(buckets);
//!
//! assert_eq!(survivors.len(), 2);
//! assert_eq!(stats.dropped_records, 1);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::scanner::{FileRecord, Fingerprint};

/// Bucket key used once content has been sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    /// File size in bytes
    pub size: u64,
    /// Fingerprint from the most recent stage
    pub fingerprint: Fingerprint,
}

/// Anything that wraps a [`FileRecord`] and can be bucketed.
pub trait Candidate {
    /// The underlying record.
    fn record(&self) -> &FileRecord;
}

impl Candidate for FileRecord {
    fn record(&self) -> &FileRecord {
        self
    }
}

/// A record together with the fingerprint a stage computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledRecord {
    /// The candidate file
    pub record: FileRecord,
    /// Fingerprint from the stage that produced this value
    pub fingerprint: Fingerprint,
}

impl SampledRecord {
    /// Key under which this record is grouped.
    #[must_use]
    pub fn key(&self) -> BucketKey {
        BucketKey {
            size: self.record.size,
            fingerprint: self.fingerprint,
        }
    }
}

impl Candidate for SampledRecord {
    fn record(&self) -> &FileRecord {
        &self.record
    }
}

/// Outcome of one orphan elimination pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrphanStats {
    /// Groups seen
    pub groups_in: usize,
    /// Groups with two or more members
    pub groups_kept: usize,
    /// Records in surviving groups
    pub kept_records: usize,
    /// Records dropped as singletons
    pub dropped_records: usize,
}

impl OrphanStats {
    /// Percentage of records eliminated by this pass.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        let total = self.kept_records + self.dropped_records;
        if total == 0 {
            0.0
        } else {
            (self.dropped_records as f64 / total as f64) * 100.0
        }
    }
}

/// Partition items by an arbitrary key.
///
/// Pure: performs no I/O and keeps the relative order of items that share
/// a key.
pub fn bucket_by<K, T, F>(items: impl IntoIterator<Item = T>, mut key_fn: F) -> HashMap<K, Vec<T>>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut buckets: HashMap<K, Vec<T>> = HashMap::new();
    for item in items {
        buckets.entry(key_fn(&item)).or_default().push(item);
    }
    buckets
}

/// Drop every group with fewer than two members and flatten the rest.
///
/// The result is deterministic regardless of the order items were
/// inserted in: groups are emitted in key order and members in
/// [`FileId`](crate::scanner::FileId) order.
pub fn remove_orphans<K, T>(groups: HashMap<K, Vec<T>>) -> (Vec<T>, OrphanStats)
where
    K: Ord,
    T: Candidate,
{
    let mut stats = OrphanStats {
        groups_in: groups.len(),
        ..OrphanStats::default()
    };

    let mut kept: Vec<(K, Vec<T>)> = groups
        .into_iter()
        .filter(|(_, members)| {
            if members.len() < 2 {
                stats.dropped_records += members.len();
                if let Some(only) = members.first() {
                    log::trace!("Eliminated singleton: {}", only.record().path.display());
                }
                false
            } else {
                stats.groups_kept += 1;
                stats.kept_records += members.len();
                true
            }
        })
        .collect();

    kept.sort_by(|a, b| a.0.cmp(&b.0));

    let survivors = kept
        .into_iter()
        .flat_map(|(_, mut members)| {
            members.sort_by_key(|m| m.record().id);
            members
        })
        .collect();

    (survivors, stats)
}

/// Confirmed duplicate set with the copy to keep already chosen.
///
/// Immutable once built by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// File size in bytes (shared by every member)
    pub size: u64,
    /// BLAKE3 digest of the content
    pub digest: [u8; 32],
    /// The copy that survives
    pub keep: FileRecord,
    /// Copies to delete, in keep-preference order
    pub remove: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Total number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.remove.len() + 1
    }

    /// Always false: a group has at least its keep record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of copies to delete.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.remove.len()
    }

    /// Bytes freed by deleting every remove record.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.remove.len() as u64
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        blake3::Hash::from(self.digest).to_hex().to_string()
    }
}
