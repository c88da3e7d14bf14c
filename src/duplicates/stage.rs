//! Bounded-concurrency content sampling stage.
//!
//! # Overview
//!
//! A [`SamplingStage`] fingerprints every candidate with one
//! [`ReadStrategy`], re-partitions the candidates by
//! [`BucketKey`] and removes the orphans.
//!
//! # Concurrency
//!
//! Candidates are split into size tiers which run one after another. Each
//! tier gets its own rayon pool of N workers, where N comes from
//! [`WorkerTiers`]:
//!
//! ```text
//!   producer ──(bounded jobs)──▶ N workers ──(bounded results)──▶ orchestrator
//! ```
//!
//! Both queues hold `queue_depth × N` items, so memory stays bounded no
//! matter how many candidates there are. The orchestrator (the calling
//! thread) is the only owner of the result map and drains until every
//! worker has dropped its sender.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use crossbeam_channel::bounded;

use crate::progress::ProgressCallback;
use crate::scanner::{FileRecord, ReadStrategy, Sample, SampleError, Sampler};

use super::finder::FinderError;
use super::groups::{remove_orphans, BucketKey, OrphanStats, SampledRecord};

/// Files at or below this size are "small" (1 MiB).
pub const DEFAULT_SMALL_FILE_THRESHOLD: u64 = 1024 * 1024;
/// Files at or above this size are "large" (1 GiB).
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 1024 * 1024 * 1024;
/// Workers for small files.
pub const DEFAULT_SMALL_FILE_WORKERS: usize = 10;
/// Workers for files between the thresholds.
pub const DEFAULT_MEDIUM_FILE_WORKERS: usize = 4;
/// Workers for large files.
pub const DEFAULT_LARGE_FILE_WORKERS: usize = 2;
/// Jobs queued per worker.
pub const DEFAULT_QUEUE_DEPTH: usize = 2;

/// Size class of a file, which decides how many workers read it at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeTier {
    /// Up to and including the small threshold
    Small,
    /// Between the thresholds
    Medium,
    /// At or above the large threshold
    Large,
}

impl SizeTier {
    /// Every tier, in processing order.
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Large];
}

/// Worker counts per size tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerTiers {
    /// Upper bound (inclusive) of the small tier
    pub small_threshold: u64,
    /// Lower bound (inclusive) of the large tier
    pub large_threshold: u64,
    /// Workers for small files
    pub small_workers: usize,
    /// Workers for medium files
    pub medium_workers: usize,
    /// Workers for large files
    pub large_workers: usize,
    /// Hard cap applied to every tier
    pub max_workers: usize,
}

impl Default for WorkerTiers {
    fn default() -> Self {
        Self {
            small_threshold: DEFAULT_SMALL_FILE_THRESHOLD,
            large_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            small_workers: DEFAULT_SMALL_FILE_WORKERS,
            medium_workers: DEFAULT_MEDIUM_FILE_WORKERS,
            large_workers: DEFAULT_LARGE_FILE_WORKERS,
            max_workers: default_max_workers(),
        }
    }
}

/// Default worker cap: twice the available hardware parallelism.
#[must_use]
pub fn default_max_workers() -> usize {
    rayon::current_num_threads().saturating_mul(2).max(1)
}

impl WorkerTiers {
    /// Size class of a file of `size` bytes.
    #[must_use]
    pub fn tier_of(&self, size: u64) -> SizeTier {
        if size <= self.small_threshold {
            SizeTier::Small
        } else if size >= self.large_threshold {
            SizeTier::Large
        } else {
            SizeTier::Medium
        }
    }

    /// Worker count for a tier, capped by `max_workers` and never zero.
    #[must_use]
    pub fn workers_for(&self, tier: SizeTier) -> usize {
        let wanted = match tier {
            SizeTier::Small => self.small_workers,
            SizeTier::Medium => self.medium_workers,
            SizeTier::Large => self.large_workers,
        };
        wanted.min(self.max_workers).max(1)
    }
}

/// Statistics from one sampling stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageStats {
    /// Candidates handed to the stage
    pub input_files: usize,
    /// Total size of those candidates
    pub input_bytes: u64,
    /// Bytes the stage expected to read
    pub estimated_bytes: u64,
    /// Bytes actually read
    pub bytes_read: u64,
    /// Files excluded because they could not be read
    pub failed_files: usize,
    /// Candidates that survived the orphan filter
    pub output_files: usize,
    /// Total size of the survivors
    pub output_bytes: u64,
    /// Groups among the survivors
    pub groups: usize,
    /// Wall time spent in the stage
    pub duration: Duration,
}

impl StageStats {
    /// Percentage of input files eliminated by the stage.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files.saturating_sub(self.output_files);
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }
}

/// Everything a stage produced.
#[derive(Debug)]
pub struct StageOutput {
    /// Fingerprinted survivors, grouped order (see [`remove_orphans`])
    pub survivors: Vec<SampledRecord>,
    /// Stage statistics
    pub stats: StageStats,
    /// Per-file failures; the files are excluded from the survivors
    pub failures: Vec<SampleError>,
}

/// One content sampling pass over the candidates.
pub struct SamplingStage {
    strategy: ReadStrategy,
    sampler: Sampler,
    tiers: WorkerTiers,
    queue_depth: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for SamplingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingStage")
            .field("strategy", &self.strategy)
            .field("sampler", &self.sampler)
            .field("tiers", &self.tiers)
            .field("queue_depth", &self.queue_depth)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl SamplingStage {
    /// Create a stage for `strategy`.
    #[must_use]
    pub fn new(strategy: ReadStrategy, sampler: Sampler, tiers: WorkerTiers) -> Self {
        Self {
            strategy,
            sampler,
            tiers,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the number of jobs queued per worker (at least one).
    #[must_use]
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Set the shutdown flag checked by workers before each job.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback, invoked from the draining thread.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The strategy this stage reads with.
    #[must_use]
    pub fn strategy(&self) -> ReadStrategy {
        self.strategy
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn estimate_bytes(&self, records: &[FileRecord]) -> u64 {
        match self.strategy {
            ReadStrategy::Full => records.iter().map(|r| r.size).sum(),
            ReadStrategy::Prefix | ReadStrategy::Suffix => {
                self.sampler.sample_size().saturating_mul(records.len() as u64)
            }
        }
    }

    /// Fingerprint, re-bucket and filter `records`.
    ///
    /// # Errors
    ///
    /// [`FinderError::Interrupted`] if the shutdown flag is raised, or
    /// [`FinderError::ThreadPool`] if a worker pool cannot be built.
    /// Unreadable files are not errors; they are returned in
    /// [`StageOutput::failures`].
    pub fn run(&self, records: Vec<FileRecord>) -> Result<StageOutput, FinderError> {
        if self.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let start = Instant::now();
        let phase = self.strategy.phase_name();
        let mut stats = StageStats {
            input_files: records.len(),
            input_bytes: records.iter().map(|r| r.size).sum(),
            estimated_bytes: self.estimate_bytes(&records),
            ..StageStats::default()
        };

        log::info!(
            "Stage {}: reading {} files (~{} bytes)",
            phase,
            stats.input_files,
            stats.estimated_bytes
        );
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(phase, records.len());
            callback.on_message(&format!("~{} to read", ByteSize::b(stats.estimated_bytes)));
        }

        let mut by_tier: HashMap<SizeTier, Vec<FileRecord>> = HashMap::new();
        for record in records {
            by_tier
                .entry(self.tiers.tier_of(record.size))
                .or_default()
                .push(record);
        }

        let mut buckets: HashMap<BucketKey, Vec<SampledRecord>> = HashMap::new();
        let mut failures = Vec::new();
        let mut completed = 0usize;
        let (sampler, strategy) = (self.sampler, self.strategy);
        let read = |record: &FileRecord| sampler.sample(&record.path, strategy);

        for tier in SizeTier::ALL {
            let Some(jobs) = by_tier.remove(&tier) else {
                continue;
            };
            let workers = self.tiers.workers_for(tier);
            log::debug!(
                "Stage {}: {:?} tier, {} files, {} workers",
                phase,
                tier,
                jobs.len(),
                workers
            );

            self.run_tier(jobs, workers, &read, |record, result| {
                completed += 1;
                if let Some(ref callback) = self.progress_callback {
                    callback.on_progress(completed, record.path.to_string_lossy().as_ref());
                }
                match result {
                    Ok(sample) => {
                        stats.bytes_read += sample.bytes_read;
                        if let Some(ref callback) = self.progress_callback {
                            callback.on_item_completed(sample.bytes_read);
                        }
                        log::trace!(
                            "{} {}: {}",
                            phase,
                            record.path.display(),
                            sample.fingerprint
                        );
                        let sampled = SampledRecord {
                            record,
                            fingerprint: sample.fingerprint,
                        };
                        buckets.entry(sampled.key()).or_default().push(sampled);
                    }
                    Err(e) => {
                        log::warn!("Failed to read {}: {}", record.path.display(), e);
                        failures.push(e);
                    }
                }
            })?;

            if self.is_shutdown_requested() {
                log::info!("Stage {}: Interrupted by shutdown signal", phase);
                if let Some(ref callback) = self.progress_callback {
                    callback.on_phase_end(phase);
                }
                return Err(FinderError::Interrupted);
            }
        }

        let (survivors, orphan_stats): (Vec<SampledRecord>, OrphanStats) = remove_orphans(buckets);

        stats.failed_files = failures.len();
        stats.output_files = survivors.len();
        stats.output_bytes = survivors.iter().map(|s| s.record.size).sum();
        stats.groups = orphan_stats.groups_kept;
        stats.duration = start.elapsed();

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(phase);
        }

        log::info!(
            "Stage {} complete: {} files → {} candidates in {} groups ({:.1}% eliminated, {} failed, {} bytes read)",
            phase,
            stats.input_files,
            stats.output_files,
            stats.groups,
            stats.elimination_rate(),
            stats.failed_files,
            stats.bytes_read
        );

        Ok(StageOutput {
            survivors,
            stats,
            failures,
        })
    }

    /// Run one tier through a producer, `workers` pooled readers and the
    /// calling thread as the single consumer.
    ///
    /// At most `workers` calls to `read` are in flight at any time.
    fn run_tier<R, F>(
        &self,
        jobs: Vec<FileRecord>,
        workers: usize,
        read: &R,
        mut on_result: F,
    ) -> Result<(), FinderError>
    where
        R: Fn(&FileRecord) -> Result<Sample, SampleError> + Sync,
        F: FnMut(FileRecord, Result<Sample, SampleError>),
    {
        let phase = self.strategy.phase_name();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("{phase}-{i}"))
            .build()?;

        let capacity = workers.saturating_mul(self.queue_depth).max(1);
        let (job_tx, job_rx) = bounded::<FileRecord>(capacity);
        let (result_tx, result_rx) = bounded::<(FileRecord, Result<Sample, SampleError>)>(capacity);

        let pool = &pool;

        std::thread::scope(|s| {
            s.spawn(move || {
                for job in jobs {
                    // Fails once every worker has stopped
                    if job_tx.send(job).is_err() {
                        break;
                    }
                }
            });

            s.spawn(move || {
                pool.scope(|ps| {
                    for _ in 0..workers {
                        let job_rx = job_rx.clone();
                        let result_tx = result_tx.clone();
                        let shutdown = self.shutdown_flag.clone();
                        ps.spawn(move |_| {
                            for record in &job_rx {
                                if shutdown.as_ref().is_some_and(|f| f.load(Ordering::SeqCst)) {
                                    break;
                                }
                                let result = read(&record);
                                if result_tx.send((record, result)).is_err() {
                                    break;
                                }
                            }
                        });
                    }
                });
                drop(job_rx);
                drop(result_tx);
            });

            for (record, result) in &result_rx {
                on_result(record, result);
            }
        });

        Ok(())
    }
}
