//! Duplicate finder implementation with multi-stage detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Size**: Group candidates by size and drop singletons
//! 2. **Prefix**: Fingerprint the first `sample_size` bytes
//! 3. **Suffix**: Fingerprint the last `sample_size` bytes
//! 4. **Full hash**: BLAKE3 over the whole content
//! 5. **Resolve**: Pick the copy to keep in each group
//!
//! Orphans are removed after every step, and the pipeline stops as soon
//! as fewer than two candidates remain.
//!
//! # Example
//!
//! ```no_run
//! use dupcull::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let mut finder = DuplicateFinder::new(FinderConfig::default());
//! let roots = vec![PathBuf::from("/data"), PathBuf::from("/backup")];
//! let (groups, summary) = finder.find_duplicates_in_paths(&roots).unwrap();
//!
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::progress::ProgressCallback;
use crate::scanner::sampler::{DEFAULT_CHUNK_SIZE, DEFAULT_SAMPLE_SIZE};
use crate::scanner::{FileRecord, ReadStrategy, SampleError, Sampler, ScanError, Walker};

use super::groups::{bucket_by, remove_orphans, DuplicateGroup};
use super::resolver::{resolve, ConsistencyError};
use super::stage::{SamplingStage, StageStats, WorkerTiers, DEFAULT_QUEUE_DEPTH};
use super::store::{RecordStore, StoreStats};

/// Check that a sample size is a positive power of two.
///
/// # Errors
///
/// [`FinderError::InvalidSampleSize`] otherwise.
pub fn validate_sample_size(sample_size: u64) -> Result<(), FinderError> {
    if sample_size.is_power_of_two() {
        Ok(())
    } else {
        Err(FinderError::InvalidSampleSize(sample_size))
    }
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Bytes sampled by the prefix and suffix stages (power of two)
    pub sample_size: u64,
    /// Read buffer for full hashing
    pub chunk_size: usize,
    /// Worker counts per size tier
    pub tiers: WorkerTiers,
    /// Jobs queued per worker
    pub queue_depth: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("sample_size", &self.sample_size)
            .field("chunk_size", &self.chunk_size)
            .field("tiers", &self.tiers)
            .field("queue_depth", &self.queue_depth)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            tiers: WorkerTiers::default(),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the sample size.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: u64) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Set the full-hash read buffer size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the worker tiers.
    #[must_use]
    pub fn with_tiers(mut self, tiers: WorkerTiers) -> Self {
        self.tiers = tiers;
        self
    }

    /// Cap the number of concurrent workers.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.tiers.max_workers = max_workers;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// [`FinderError::InvalidSampleSize`] or [`FinderError::InvalidConfig`].
    pub fn validate(&self) -> Result<(), FinderError> {
        validate_sample_size(self.sample_size)?;
        if self.chunk_size == 0 {
            return Err(FinderError::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.queue_depth == 0 {
            return Err(FinderError::InvalidConfig("queue_depth must be positive".into()));
        }
        let t = &self.tiers;
        if t.small_workers == 0 || t.medium_workers == 0 || t.large_workers == 0 {
            return Err(FinderError::InvalidConfig("worker counts must be positive".into()));
        }
        if t.max_workers == 0 {
            return Err(FinderError::InvalidConfig("max_workers must be positive".into()));
        }
        if t.small_threshold >= t.large_threshold {
            return Err(FinderError::InvalidConfig(format!(
                "small_file_threshold ({}) must be below large_file_threshold ({})",
                t.small_threshold, t.large_threshold
            )));
        }
        Ok(())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn stage(&self, strategy: ReadStrategy, sample_size: u64) -> SamplingStage {
        let mut stage = SamplingStage::new(
            strategy,
            Sampler::new(sample_size, self.chunk_size),
            self.tiers,
        )
        .with_queue_depth(self.queue_depth);
        if let Some(ref flag) = self.shutdown_flag {
            stage = stage.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.progress_callback {
            stage = stage.with_progress_callback(callback.clone());
        }
        stage
    }
}

/// Summary statistics from a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineSummary {
    /// Files found by the walker (zero when records were added directly)
    pub scanned_files: usize,
    /// Records ignored because their identifier was already present
    pub hardlinks_collapsed: usize,
    /// Traversal errors that were skipped
    pub scan_errors: usize,
    /// Working set when the pipeline started
    pub candidates: StoreStats,
    /// Working set after size bucketing
    pub after_size: StoreStats,
    /// Prefix stage statistics, if it ran
    pub prefix: Option<StageStats>,
    /// Suffix stage statistics, if it ran
    pub suffix: Option<StageStats>,
    /// Full hash statistics, if it ran
    pub full: Option<StageStats>,
    /// Files excluded because they could not be read
    pub read_failures: Vec<SampleError>,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Files scheduled for removal
    pub duplicate_files: usize,
    /// Bytes freed by removing every duplicate
    pub reclaimable_space: u64,
    /// Whether the pipeline stopped early for lack of candidates
    pub early_exit: bool,
    /// Wall time of the run
    pub duration: Duration,
}

impl PipelineSummary {
    /// Total bytes read across all stages.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        [&self.prefix, &self.suffix, &self.full]
            .into_iter()
            .flatten()
            .map(|s| s.bytes_read)
            .sum()
    }

    /// Percentage of the candidate bytes that are duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.candidates.bytes == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.candidates.bytes as f64) * 100.0
        }
    }

    fn record_stage(&mut self, strategy: ReadStrategy, stats: StageStats) {
        match strategy {
            ReadStrategy::Prefix => self.prefix = Some(stats),
            ReadStrategy::Suffix => self.suffix = Some(stats),
            ReadStrategy::Full => self.full = Some(stats),
        }
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The sample size is not a positive power of two.
    #[error("Sample size must be a positive power of two, got {0}")]
    InvalidSampleSize(u64),

    /// Some other setting is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No directories were given.
    #[error("No directories to scan")]
    NoDirectories,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A scan error occurred.
    #[error(transparent)]
    ScanError(ScanError),

    /// A file changed between scanning and resolution.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// A worker pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<ScanError> for FinderError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::NotFound(path) => Self::PathNotFound(path),
            ScanError::NotADirectory(path) => Self::NotADirectory(path),
            other => Self::ScanError(other),
        }
    }
}

/// Duplicate finder that owns the working set and runs the pipeline.
///
/// Records can be added directly with [`add_record`](Self::add_record) or
/// collected from directories by
/// [`find_duplicates_in_paths`](Self::find_duplicates_in_paths). The working
/// set is empty again once a run returns.
pub struct DuplicateFinder {
    config: FinderConfig,
    store: RecordStore,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            store: RecordStore::new(),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Add a candidate. Returns `false` if its identifier is already known.
    pub fn add_record(&mut self, record: FileRecord) -> bool {
        self.store.add_record(record)
    }

    /// Current size of the working set.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Walk `roots` and run the pipeline over everything found.
    ///
    /// Earlier roots get higher priority.
    ///
    /// # Errors
    ///
    /// Pre-flight errors (no roots, a root missing or not a directory, an
    /// invalid configuration) as well as everything
    /// [`run_pipeline`](Self::run_pipeline) can return.
    pub fn find_duplicates_in_paths(
        &mut self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, PipelineSummary), FinderError> {
        if roots.is_empty() {
            return Err(FinderError::NoDirectories);
        }
        self.config.validate()?;

        let mut walker = Walker::new(roots.to_vec());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        walker.validate_roots()?;

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let mut scanned = 0usize;
        let mut collapsed = 0usize;
        let mut errors = 0usize;
        for result in walker.walk() {
            match result {
                Ok(record) => {
                    scanned += 1;
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(scanned, record.path.to_string_lossy().as_ref());
                    }
                    if !self.store.add_record(record) {
                        collapsed += 1;
                    }
                }
                Err(_) => errors += 1,
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        if self.config.is_shutdown_requested() {
            self.store.reset();
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} files in {} root(s) ({} hardlinks collapsed, {} errors)",
            scanned,
            roots.len(),
            collapsed,
            errors
        );

        let (groups, mut summary) = self.run_pipeline(self.config.sample_size)?;
        summary.scanned_files = scanned;
        summary.hardlinks_collapsed = collapsed;
        summary.scan_errors = errors;
        Ok((groups, summary))
    }

    /// Run every stage over the current working set.
    ///
    /// The working set is consumed: afterwards the finder is empty and
    /// ready for a new set of records.
    ///
    /// # Errors
    ///
    /// [`FinderError::InvalidSampleSize`] before any work is done,
    /// [`FinderError::Interrupted`] on shutdown, and
    /// [`FinderError::Consistency`] if a file changed before resolution.
    pub fn run_pipeline(
        &mut self,
        sample_size: u64,
    ) -> Result<(Vec<DuplicateGroup>, PipelineSummary), FinderError> {
        let result = self.run_stages(sample_size);
        self.store.reset();
        result
    }

    fn run_stages(
        &mut self,
        sample_size: u64,
    ) -> Result<(Vec<DuplicateGroup>, PipelineSummary), FinderError> {
        validate_sample_size(sample_size)?;

        let start = Instant::now();
        let mut summary = PipelineSummary {
            candidates: self.store.stats(),
            ..PipelineSummary::default()
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Pipeline: {} candidates ({} bytes), sample size {}",
            summary.candidates.files,
            summary.candidates.bytes,
            sample_size
        );

        let (survivors, size_stats) = remove_orphans(bucket_by(self.store.take_records(), |r| r.size));
        self.store.replace_records(survivors);
        summary.after_size = self.store.stats();
        log::info!(
            "Size grouping complete: {} → {} files ({:.1}% eliminated)",
            summary.candidates.files,
            summary.after_size.files,
            size_stats.elimination_rate()
        );

        for strategy in [ReadStrategy::Prefix, ReadStrategy::Suffix] {
            if self.store.len() < 2 {
                return Ok(Self::finish_early(summary, start));
            }
            if self.config.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }

            let output = self
                .config
                .stage(strategy, sample_size)
                .run(self.store.take_records())?;
            self.store
                .replace_records(output.survivors.into_iter().map(|s| s.record));
            summary.read_failures.extend(output.failures);
            summary.record_stage(strategy, output.stats);
        }

        if self.store.len() < 2 {
            return Ok(Self::finish_early(summary, start));
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let output = self
            .config
            .stage(ReadStrategy::Full, sample_size)
            .run(self.store.take_records())?;
        summary.read_failures.extend(output.failures);
        summary.record_stage(ReadStrategy::Full, output.stats);

        let groups = resolve(output.survivors)?;

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.duration = start.elapsed();

        log::info!(
            "Pipeline complete: {} duplicate groups, {} files to remove, {} bytes reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_space
        );

        Ok((groups, summary))
    }

    fn finish_early(
        mut summary: PipelineSummary,
        start: Instant,
    ) -> (Vec<DuplicateGroup>, PipelineSummary) {
        log::info!("No possible duplicates");
        summary.early_exit = true;
        summary.duration = start.elapsed();
        (Vec::new(), summary)
    }
}
