//! Command-line interface definitions.
//!
//! ```bash
//! # Report duplicates under two trees; files under ~/photos are kept first
//! dupcull ~/photos ~/backup/photos
//!
//! # Actually delete the duplicates
//! dupcull --remove ~/photos ~/backup/photos
//!
//! # Smaller samples, JSON report
//! dupcull --sample-size 64KiB --output json ~/music
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Find and remove duplicate files.
///
/// Candidates are narrowed by size, then by a sample of their first and
/// last bytes, and finally confirmed with a full BLAKE3 hash. In each
/// group of identical files one is kept: the one from the directory
/// listed first, then the one with the lowest inode.
#[derive(Debug, Parser)]
#[command(name = "dupcull")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to scan, highest priority first
    #[arg(value_name = "DIR", required_unless_present = "print_config")]
    pub dirs: Vec<PathBuf>,

    /// Delete duplicates instead of only reporting them
    #[arg(long)]
    pub remove: bool,

    /// Bytes compared at each end of a file before full hashing (power of two)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub sample_size: Option<u64>,

    /// Upper bound on concurrent file readers
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Config file (default: platform config directory)
    #[arg(long, value_name = "PATH", env = "DUPCULL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress bars and everything but errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON document on stdout
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size such as `4096`, `64KiB` or `1MB`.
///
/// Decimal suffixes (KB, MB, ...) are powers of 1000, binary ones
/// (KiB, MiB, ...) powers of 1024. Suffixes are case-insensitive.
///
/// ```
/// use dupcull::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error for an empty string, a malformed or negative number,
/// or an unknown suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1 << 10,
        "MB" | "M" => 1_000_000,
        "MIB" => 1 << 20,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1 << 30,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    // Whole numbers stay exact; fractions go through f64.
    if let Ok(whole) = num_str.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Size too large: '{s}'"));
    }

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;
    Ok((num * multiplier as f64) as u64)
}
