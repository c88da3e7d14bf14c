//! dupcull - multi-stage duplicate file remover
//!
//! Files under one or more directory trees are narrowed down to duplicate
//! groups in increasingly expensive steps: size, a prefix sample, a suffix
//! sample and finally a full BLAKE3 hash. One file per group is kept (the
//! one from the earliest root, then the lowest inode) and the rest are
//! reported or removed.
//!
//! ```no_run
//! use dupcull::duplicates::DuplicateFinder;
//! use std::path::PathBuf;
//!
//! let mut finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder
//!     .find_duplicates_in_paths(&[PathBuf::from("/data/a"), PathBuf::from("/data/b")])
//!     .unwrap();
//! for group in &groups {
//!     println!("keep {} ({} copies)", group.keep.path.display(), group.remove.len());
//! }
//! println!("{} bytes reclaimable", summary.reclaimable_space);
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::actions::{remove_duplicates, DeleteConfig};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run one invocation of the tool.
///
/// # Errors
///
/// Any configuration, pre-flight, consistency or interruption error. The
/// caller maps it to a process exit code with [`ExitCode::from_error`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let started = Instant::now();
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(&cli).context("Failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::Success);
    }

    let handler = signal::install_handler()?;

    let mut finder_config = config
        .to_finder_config()
        .with_shutdown_flag(handler.get_flag());
    if !cli.quiet {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let mut finder = DuplicateFinder::new(finder_config);
    let (groups, mut summary) = finder.find_duplicates_in_paths(&cli.dirs)?;

    let delete_config = if cli.remove {
        DeleteConfig::remove()
    } else {
        DeleteConfig::dry_run()
    }
    .with_shutdown_flag(handler.get_flag());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.output {
        OutputFormat::Text => {
            let text = TextOutput::new(&groups, &summary);
            text.write_groups(&mut out)?;
            if !groups.is_empty() {
                TextOutput::write_banner(&mut out, delete_config.dry_run)?;
            }
            out.flush()?;

            let report = remove_duplicates(&groups, &delete_config)?;
            summary.duration = started.elapsed();
            TextOutput::new(&groups, &summary).write_removal(&mut out, &report)?;
        }
        OutputFormat::Json => {
            if cli.remove && !groups.is_empty() {
                log::warn!("Removing {} duplicate files", summary.duplicate_files);
            }
            let report = remove_duplicates(&groups, &delete_config)?;
            summary.duration = started.elapsed();
            JsonOutput::new(&groups, &summary, &report).write_to(&mut out)?;
        }
    }
    out.flush()?;

    Ok(ExitCode::Success)
}
