use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Install the Ctrl-C handler. The returned flag is raised on interrupt; running
/// ffmpeg steps poll it and kill their child process.
pub fn setup_shutdown_signal() -> Result<Arc<AtomicBool>> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\nInterrupt received, stopping after the current step...");
    })
    .context("Failed to install Ctrl-C handler")?;

    Ok(shutdown_signal)
}

/// Clear a previous interrupt before starting a new run from the menu.
pub fn reset_shutdown_signal(shutdown_signal: &AtomicBool) {
    shutdown_signal.store(false, Ordering::SeqCst);
}
