//! Ctrl+C handling.
//!
//! A single [`ShutdownHandler`] wraps the `AtomicBool` that the walker,
//! every sampling worker and the removal loop poll. Pressing Ctrl+C sets
//! the flag; work in flight finishes its current file and the run ends
//! with [`ExitCode::Interrupted`](crate::error::ExitCode::Interrupted).
//! No file is deleted after the flag is
//! observed.
//!
//! ```rust,no_run
//! use dupcull::duplicates::FinderConfig;
//! use dupcull::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with the flag cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The flag itself, for handing to workers.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// The OS hook can only be registered once per process. Later calls (for
/// example from several tests running `run_app`) get the same handler
/// back with its flag cleared.
///
/// # Errors
///
/// Currently always `Ok`: if `ctrlc` refuses the hook, a handler without
/// a signal hook is returned so manual shutdown still works.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    // The hook is registered inside `get_or_init`, so it always targets the
    // stored flag; concurrent callers block until registration is done.
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        let hooked = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\nInterrupted. Finishing current files...");
            let _ = stderr.flush();
            log::info!("Shutdown signal received");
        });
        if let Err(e) = hooked {
            log::debug!("Ctrl+C hook unavailable ({}), using unhooked handler", e);
        }
        handler
    });

    handler.reset();
    Ok(handler.clone())
}
