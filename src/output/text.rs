//! Plain-text report.
//!
//! ```text
//! Checksum: af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262
//! Size: 8 B
//! Keep: /data/a/f1
//! Remove: /data/a/f3
//! Remove: /data/b/f4
//!
//! Duplicate groups: 1 Duplicate files: 2 Reclaimable: 16 B (50.0%)
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::actions::RemovalReport;
use crate::duplicates::{DuplicateGroup, PipelineSummary};

/// Text renderer for one run.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a PipelineSummary,
}

impl<'a> TextOutput<'a> {
    /// Borrow the groups and totals of a finished pipeline run.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a PipelineSummary) -> Self {
        Self { groups, summary }
    }

    /// Write one block per group, then the pipeline totals.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_groups<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.summary.early_exit || self.groups.is_empty() {
            writeln!(writer, "No possible duplicates")?;
        }

        for group in self.groups {
            writeln!(writer, "Checksum: {}", group.hash_hex())?;
            writeln!(writer, "Size: {}", ByteSize::b(group.size))?;
            writeln!(writer, "Keep: {}", group.keep.path.display())?;
            for record in &group.remove {
                writeln!(writer, "Remove: {}", record.path.display())?;
            }
            writeln!(writer)?;
        }

        writeln!(
            writer,
            "Duplicate groups: {} Duplicate files: {} Reclaimable: {} ({:.1}%)",
            self.summary.duplicate_groups,
            self.summary.duplicate_files,
            ByteSize::b(self.summary.reclaimable_space),
            self.summary.wasted_percentage()
        )?;
        if !self.summary.read_failures.is_empty() {
            writeln!(
                writer,
                "Unreadable files skipped: {}",
                self.summary.read_failures.len()
            )?;
        }
        Ok(())
    }

    /// Write the removal banner. Printed before anything is deleted.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_banner<W: Write>(writer: &mut W, dry_run: bool) -> io::Result<()> {
        if dry_run {
            writeln!(writer, "Dry run: no files will be removed (pass --remove to delete)")
        } else {
            writeln!(writer, "WARNING: duplicate files are being removed")
        }
    }

    /// Write the removal outcome and the total run time.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_removal<W: Write>(
        &self,
        writer: &mut W,
        report: &RemovalReport,
    ) -> io::Result<()> {
        for (path, reason) in &report.failures {
            writeln!(writer, "Failed: {} ({})", path.display(), reason)?;
        }
        writeln!(writer, "{}", report.summary())?;
        writeln!(writer, "Took: {:.2?}", self.summary.duration)
    }
}
