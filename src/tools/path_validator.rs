use anyhow::{Result, bail};
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Path does not exist: {}", path.display());
    }
    if !path.is_file() {
        bail!("Path is not a file: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Sibling path a step writes to before its output is validated, e.g.
/// `clip__full_30.partial-<uuid>.mp4`. Never mistaken for a cached artifact.
#[must_use]
pub fn partial_path_for(final_path: &Path) -> PathBuf {
    let stem = final_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let tag = Uuid::new_v4().simple();
    let file_name = match final_path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.partial-{tag}.{ext}"),
        None => format!("{stem}.partial-{tag}"),
    };
    final_path.with_file_name(file_name)
}

/// Move a validated partial output into its final place.
pub fn commit_partial(partial_path: &Path, final_path: &Path) -> io::Result<()> {
    if final_path.exists() {
        fs::remove_file(final_path)?;
    }
    fs::rename(partial_path, final_path)
}

/// Delete a file if present; failures are logged, not propagated.
pub fn discard_file(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => info!("Removed partial output: {}", path.display()),
        Err(e) => warn!("Failed to remove {}: {e}", path.display()),
    }
}

/// Delete a directory tree if present; failures are logged, not propagated.
pub fn discard_directory(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_dir_all(path) {
        Ok(()) => info!("Removed directory: {}", path.display()),
        Err(e) => warn!("Failed to remove {}: {e}", path.display()),
    }
}
