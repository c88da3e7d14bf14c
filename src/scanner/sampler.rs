//! Content sampling for the narrowing stages.
//!
//! # Overview
//!
//! A [`Sampler`] reads a bounded slice of a file (or the whole file) and
//! reduces it to a [`Fingerprint`]:
//!
//! | Strategy | Bytes read | Fingerprint |
//! |----------|------------|-------------|
//! | Prefix   | first `sample_size` bytes | xxh3-64 |
//! | Suffix   | last `sample_size` bytes  | xxh3-64 |
//! | Full     | every byte, in `chunk_size` chunks | BLAKE3 |
//!
//! Files shorter than the sample are read exactly; nothing is padded.
//! The quick fingerprints only ever discard candidates, so a collision
//! costs a little extra I/O later and never a wrong deletion.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use super::SampleError;

/// Default number of bytes sampled from each end of a file (1 MiB).
pub const DEFAULT_SAMPLE_SIZE: u64 = 1024 * 1024;

/// Default read buffer for full hashing (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Which part of a file a stage looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStrategy {
    /// Leading bytes
    Prefix,
    /// Trailing bytes
    Suffix,
    /// Entire content
    Full,
}

impl ReadStrategy {
    /// Stable phase name used in logs and progress output.
    #[must_use]
    pub const fn phase_name(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Full => "fullhash",
        }
    }
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phase_name())
    }
}

/// Content fingerprint produced by a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fingerprint {
    /// Non-cryptographic checksum of a sample
    Quick(u64),
    /// BLAKE3 digest of the whole file
    Digest([u8; 32]),
}

impl Fingerprint {
    /// Hex rendering, as shown in reports.
    #[must_use]
    pub fn to_hex(&self) -> String {
        match self {
            Self::Quick(v) => format!("{v:016x}"),
            Self::Digest(bytes) => blake3::Hash::from(*bytes).to_hex().to_string(),
        }
    }

    /// The full digest, if this is one.
    #[must_use]
    pub const fn digest(&self) -> Option<[u8; 32]> {
        match self {
            Self::Digest(bytes) => Some(*bytes),
            Self::Quick(_) => None,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Outcome of sampling one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Fingerprint of the bytes read
    pub fingerprint: Fingerprint,
    /// Number of bytes actually read
    pub bytes_read: u64,
}

/// Reads and fingerprints file content.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    sample_size: u64,
    chunk_size: usize,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE, DEFAULT_CHUNK_SIZE)
    }
}

impl Sampler {
    /// Create a sampler.
    ///
    /// `chunk_size` is clamped to at least one byte.
    #[must_use]
    pub fn new(sample_size: u64, chunk_size: usize) -> Self {
        Self {
            sample_size,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Bytes sampled per file by the prefix and suffix strategies.
    #[must_use]
    pub const fn sample_size(&self) -> u64 {
        self.sample_size
    }

    /// Fingerprint `path` using `strategy`.
    ///
    /// # Errors
    ///
    /// Any open, seek or read failure, classified by [`SampleError::from_io`].
    pub fn sample(&self, path: &Path, strategy: ReadStrategy) -> Result<Sample, SampleError> {
        let wrap = |e: std::io::Error| SampleError::from_io(path.to_path_buf(), e);
        let mut file = File::open(path).map_err(wrap)?;

        match strategy {
            ReadStrategy::Prefix => self.read_quick(&mut file).map_err(wrap),
            ReadStrategy::Suffix => {
                let len = file.metadata().map_err(wrap)?.len();
                file.seek(SeekFrom::Start(len.saturating_sub(self.sample_size)))
                    .map_err(wrap)?;
                self.read_quick(&mut file).map_err(wrap)
            }
            ReadStrategy::Full => self.read_full(&mut file).map_err(wrap),
        }
    }

    fn read_quick(&self, file: &mut File) -> std::io::Result<Sample> {
        let capacity = usize::try_from(self.sample_size).unwrap_or(usize::MAX).min(self.chunk_size);
        let mut buf = Vec::with_capacity(capacity);
        file.take(self.sample_size).read_to_end(&mut buf)?;
        Ok(Sample {
            fingerprint: Fingerprint::Quick(xxh3_64(&buf)),
            bytes_read: buf.len() as u64,
        })
    }

    fn read_full(&self, file: &mut File) -> std::io::Result<Sample> {
        let mut hasher = blake3::Hasher::new();
        let mut buf = vec![0u8; self.chunk_size];
        let mut total = 0u64;

        loop {
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
            total += n as u64;
        }

        Ok(Sample {
            fingerprint: Fingerprint::Digest(*hasher.finalize().as_bytes()),
            bytes_read: total,
        })
    }
}
