//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The candidate working set, deduplicated by device/inode ([`store`])
//! - Bucketing and orphan elimination ([`groups`])
//! - Prefix, suffix and full-hash sampling stages ([`stage`])
//! - Keep/remove selection ([`resolver`])
//! - Pipeline orchestration ([`finder`])

pub mod finder;
pub mod groups;
pub mod resolver;
pub mod stage;
pub mod store;

pub use finder::{validate_sample_size, DuplicateFinder, FinderConfig, FinderError, PipelineSummary};
pub use groups::{bucket_by, remove_orphans, BucketKey, DuplicateGroup, OrphanStats, SampledRecord};
pub use resolver::{keep_order, resolve, verify_size, ConsistencyError};
pub use stage::{SamplingStage, SizeTier, StageOutput, StageStats, WorkerTiers};
pub use store::{RecordStore, StoreStats};
