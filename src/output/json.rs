//! JSON report.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "af1349b9...",
//!       "size": 8,
//!       "keep": "/data/a/f1",
//!       "remove": ["/data/a/f3", "/data/b/f4"]
//!     }
//!   ],
//!   "summary": {
//!     "scanned_files": 4,
//!     "candidate_files": 4,
//!     "candidate_bytes": 32,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 2,
//!     "reclaimable_space": 16,
//!     "wasted_percentage": 50.0,
//!     "bytes_read": 56,
//!     "read_failures": 0,
//!     "duration_ms": 3,
//!     "dry_run": true,
//!     "removed_files": 2,
//!     "bytes_freed": 16,
//!     "removal_failures": 0
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::actions::RemovalReport;
use crate::duplicates::{DuplicateGroup, PipelineSummary};

/// One duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 digest, hex encoded
    pub hash: String,
    /// Size of each member in bytes
    pub size: u64,
    /// File that stays
    pub keep: String,
    /// Files that go
    pub remove: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Flatten a group into hex hash and lossy path strings.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            keep: group.keep.path.to_string_lossy().into_owned(),
            remove: group
                .remove
                .iter()
                .map(|r| r.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Run totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JsonSummary {
    /// Regular non-empty files found by the walker
    pub scanned_files: usize,
    /// Distinct files entering the pipeline (hardlinks counted once)
    pub candidate_files: usize,
    /// Total size of the candidates
    pub candidate_bytes: u64,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Files scheduled for removal
    pub duplicate_files: usize,
    /// Bytes freed by removing every duplicate
    pub reclaimable_space: u64,
    /// `reclaimable_space` as a percentage of `candidate_bytes`
    pub wasted_percentage: f64,
    /// Bytes read across the prefix, suffix and full-hash stages
    pub bytes_read: u64,
    /// Files skipped because they could not be read
    pub read_failures: usize,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Whether removal was only simulated
    pub dry_run: bool,
    /// Files removed (or that would be, on a dry run)
    pub removed_files: usize,
    /// Bytes freed (or that would be, on a dry run)
    pub bytes_freed: u64,
    /// Removals that failed without aborting the run
    pub removal_failures: usize,
}

impl JsonSummary {
    /// Combine pipeline statistics with the removal outcome.
    #[must_use]
    pub fn new(summary: &PipelineSummary, removal: &RemovalReport) -> Self {
        Self {
            scanned_files: summary.scanned_files,
            candidate_files: summary.candidates.files,
            candidate_bytes: summary.candidates.bytes,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            wasted_percentage: summary.wasted_percentage(),
            bytes_read: summary.bytes_read(),
            read_failures: summary.read_failures.len(),
            duration_ms: summary.duration.as_millis() as u64,
            dry_run: removal.dry_run,
            removed_files: removal.removed_count(),
            bytes_freed: removal.bytes_freed,
            removal_failures: removal.failure_count(),
        }
    }
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Groups, largest file size first
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Run totals
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document from a pipeline run and its removal outcome.
    #[must_use]
    pub fn new(
        groups: &[DuplicateGroup],
        summary: &PipelineSummary,
        removal: &RemovalReport,
    ) -> Self {
        Self {
            duplicates: groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            summary: JsonSummary::new(summary, removal),
        }
    }

    /// Serialize to a pretty-printed string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the document followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
